use strata2d::{ClassSet, ColliderId, ColliderSettings, CollisionClassDef, CollisionWorld, Vec2};

/// Zero-gravity world with the three classes the query scenarios use.
fn query_world() -> CollisionWorld {
    let mut world = CollisionWorld::new(0.0, 0.0, false);
    for class in ["P", "E", "N"] {
        world.add_collision_class(class, CollisionClassDef::new()).unwrap();
    }
    world
}

fn circle(world: &mut CollisionWorld, x: f32, y: f32, r: f32, class: &str) -> ColliderId {
    world
        .new_circle_collider(x, y, r, &ColliderSettings::of_class(class))
        .unwrap()
}

#[test]
fn circle_query_applies_the_class_filter() {
    let mut world = query_world();
    let _p = circle(&mut world, 100.0, 100.0, 10.0, "P");
    let e = circle(&mut world, 150.0, 100.0, 10.0, "E");
    let _n = circle(&mut world, 200.0, 100.0, 10.0, "N");

    let hits = world.query_circle_area(125.0, 100.0, 40.0, Some(&ClassSet::all_except(["P"])));
    assert_eq!(hits, vec![e]);
}

#[test]
fn circle_query_admits_exactly_the_overlapping_colliders() {
    let mut world = query_world();
    let p = circle(&mut world, 100.0, 100.0, 10.0, "P");
    let e = circle(&mut world, 150.0, 100.0, 10.0, "E");
    let n = circle(&mut world, 200.0, 100.0, 10.0, "N");

    let hits = world.query_circle_area(125.0, 100.0, 40.0, None);
    assert!(hits.contains(&p));
    assert!(hits.contains(&e));
    assert!(!hits.contains(&n));

    // grazing contact counts, a hair beyond does not
    let touch = world.query_circle_area(60.0, 100.0, 30.0, None);
    assert!(touch.contains(&p));
    let miss = world.query_circle_area(59.0, 100.0, 30.0, None);
    assert!(!miss.contains(&p));
}

#[test]
fn rectangle_query_hits_circles_and_polygons() {
    let mut world = query_world();
    let ball = circle(&mut world, 10.0, 10.0, 2.0, "P");
    let block = world
        .new_rectangle_collider(30.0, 10.0, 4.0, 4.0, &ColliderSettings::of_class("E"))
        .unwrap();

    let near = world.query_rectangle_area(5.0, 5.0, 10.0, 10.0, None);
    assert_eq!(near, vec![ball]);

    let wide = world.query_rectangle_area(5.0, 5.0, 30.0, 10.0, None);
    assert!(wide.contains(&ball));
    assert!(wide.contains(&block));

    let empty = world.query_rectangle_area(50.0, 50.0, 5.0, 5.0, None);
    assert!(empty.is_empty());
}

#[test]
fn polygon_query_uses_precise_overlap() {
    let mut world = query_world();
    let inside = circle(&mut world, 10.0, 10.0, 1.0, "P");
    let outside = circle(&mut world, 100.0, 100.0, 1.0, "E");

    let triangle = [
        Vec2::new(0.0, 0.0),
        Vec2::new(20.0, 0.0),
        Vec2::new(10.0, 20.0),
    ];
    let hits = world.query_polygon_area(&triangle, None);
    assert_eq!(hits, vec![inside]);
    assert!(!hits.contains(&outside));

    // the bounding circle of the triangle covers this spot, the precise
    // test must still reject it
    let corner_miss = circle(&mut world, 19.0, 15.0, 0.5, "N");
    let hits = world.query_polygon_area(&triangle, None);
    assert!(!hits.contains(&corner_miss));
}

#[test]
fn line_query_orders_hits_along_the_segment() {
    let mut world = query_world();
    let first = circle(&mut world, 0.0, 0.0, 1.0, "P");
    let second = circle(&mut world, 5.0, 0.0, 1.0, "E");
    let off_axis = circle(&mut world, 10.0, 5.0, 1.0, "N");

    let hits = world.query_line(-3.0, 0.0, 8.0, 0.0, None);
    assert_eq!(hits, vec![first, second]);
    assert!(!hits.contains(&off_axis));

    let filtered = world.query_line(-3.0, 0.0, 8.0, 0.0, Some(&ClassSet::named(["E"])));
    assert_eq!(filtered, vec![second]);
}

#[test]
fn edge_fixtures_participate_in_area_queries() {
    let mut world = query_world();
    let line = world
        .new_line_collider(0.0, 5.0, 10.0, 5.0, &ColliderSettings::static_body())
        .unwrap();

    let crossing = world.query_rectangle_area(2.0, 4.0, 4.0, 2.0, None);
    assert_eq!(crossing, vec![line]);

    let beside = world.query_rectangle_area(2.0, 6.5, 4.0, 2.0, None);
    assert!(beside.is_empty());

    let disc = world.query_circle_area(5.0, 6.0, 1.5, None);
    assert_eq!(disc, vec![line]);
}

#[test]
fn queries_see_colliders_before_the_first_step() {
    let mut world = query_world();
    let ball = circle(&mut world, 0.0, 0.0, 1.0, "P");
    // no update() yet
    let hits = world.query_circle_area(0.5, 0.0, 1.0, None);
    assert_eq!(hits, vec![ball]);
}

#[test]
fn multi_shape_colliders_are_reported_once() {
    let mut world = query_world();
    let id = circle(&mut world, 0.0, 0.0, 1.0, "P");
    world
        .add_shape(id, "halo", strata2d::ShapeDef::Circle { radius: 3.0 })
        .unwrap();

    let hits = world.query_circle_area(0.0, 0.0, 5.0, None);
    assert_eq!(hits, vec![id]);
}
