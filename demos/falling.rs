//! Headless demo: a ground slab, a handful of falling balls, and a ghost
//! that passes through everything while still reporting overlaps.

use strata2d::{ClassSet, ColliderSettings, CollisionClassDef, CollisionWorld};

const DT: f32 = 1.0 / 60.0;

fn main() {
    let mut world = CollisionWorld::new(0.0, 100.0, true);
    world
        .add_collision_class("Ground", CollisionClassDef::new())
        .unwrap();
    world
        .add_collision_class("Ball", CollisionClassDef::new())
        .unwrap();
    world
        .add_collision_class(
            "Ghost",
            CollisionClassDef::new().with_ignores(ClassSet::named(["Ground", "Ball"])),
        )
        .unwrap();

    world
        .new_rectangle_collider(
            0.0,
            60.0,
            200.0,
            4.0,
            &ColliderSettings::static_body().with_collision_class("Ground"),
        )
        .unwrap();

    let mut balls = Vec::new();
    for i in 0..5 {
        let x = -20.0 + 10.0 * i as f32;
        let y = -4.0 * i as f32;
        balls.push(
            world
                .new_circle_collider(x, y, 2.0, &ColliderSettings::of_class("Ball"))
                .unwrap(),
        );
    }
    let ghost = world
        .new_circle_collider(0.0, -40.0, 2.0, &ColliderSettings::of_class("Ghost"))
        .unwrap();

    for frame in 0..600 {
        world.update(DT);
        for &ball in &balls {
            if world.collider_mut(ball).unwrap().enter("Ground") {
                println!("frame {frame}: ball {ball:?} landed");
            }
        }
        if world.collider_mut(ghost).unwrap().enter("Ground") {
            println!("frame {frame}: the ghost drifted through the ground");
        }
    }

    let resting = world.query_circle_area(0.0, 56.0, 60.0, Some(&ClassSet::named(["Ball"])));
    println!("{} balls resting near the slab", resting.len());
}
