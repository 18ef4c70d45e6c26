use strata2d::{
    ColliderSettings, CollisionWorld, DebugRenderer, DrawMode, JointDef, Vec2,
};

/// Renderer that counts primitives and tracks render state.
#[derive(Default)]
struct RecordingRenderer {
    color: [f32; 4],
    line_width: f32,
    circles: usize,
    polygons: usize,
    lines: usize,
    rectangles: usize,
}

impl DebugRenderer for RecordingRenderer {
    fn color(&self) -> [f32; 4] {
        self.color
    }
    fn set_color(&mut self, rgba: [f32; 4]) {
        self.color = rgba;
    }
    fn line_width(&self) -> f32 {
        self.line_width
    }
    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }
    fn polygon(&mut self, _mode: DrawMode, _points: &[Vec2]) {
        self.polygons += 1;
    }
    fn line(&mut self, _a: Vec2, _b: Vec2) {
        self.lines += 1;
    }
    fn circle(&mut self, _mode: DrawMode, _center: Vec2, _radius: f32) {
        self.circles += 1;
    }
    fn rectangle(&mut self, _mode: DrawMode, _position: Vec2, _size: Vec2) {
        self.rectangles += 1;
    }
}

#[test]
fn draw_covers_fixtures_and_joints_and_restores_state() {
    let mut world = CollisionWorld::new(0.0, 0.0, false);
    let a = world
        .new_circle_collider(0.0, 0.0, 1.0, &ColliderSettings::new())
        .unwrap();
    let b = world
        .new_rectangle_collider(5.0, 0.0, 2.0, 2.0, &ColliderSettings::new())
        .unwrap();
    world
        .new_line_collider(-5.0, 2.0, 5.0, 2.0, &ColliderSettings::static_body())
        .unwrap();
    world
        .add_joint(
            JointDef::Spring {
                anchor_a: Vec2::ZERO,
                anchor_b: Vec2::ZERO,
                rest_length: 3.0,
                stiffness: 10.0,
                damping: 1.0,
            },
            a,
            b,
            true,
        )
        .unwrap();

    let mut renderer = RecordingRenderer {
        color: [0.1, 0.2, 0.3, 1.0],
        line_width: 2.5,
        ..RecordingRenderer::default()
    };
    world.draw(&mut renderer, 1.0);

    assert!(renderer.circles >= 3, "ball fixture plus two joint anchors");
    assert_eq!(renderer.polygons, 1, "rectangle fixture outline");
    assert!(renderer.lines >= 2, "edge fixture plus the joint segment");
    assert_eq!(renderer.color, [0.1, 0.2, 0.3, 1.0], "color restored");
    assert_eq!(renderer.line_width, 2.5, "line width restored");
}

#[test]
fn recorded_queries_fade_after_ten_frames() {
    let mut world = CollisionWorld::new(0.0, 0.0, false);
    world.set_query_debug_drawing(true);
    world.query_circle_area(0.0, 0.0, 5.0, None);

    let mut total = 0;
    for _ in 0..12 {
        let mut renderer = RecordingRenderer::default();
        world.draw(&mut renderer, 1.0);
        total += renderer.circles;
    }
    // the overlay shape is drawn for exactly ten frames
    assert_eq!(total, 10);
}

#[test]
fn queries_are_not_recorded_when_drawing_is_off() {
    let mut world = CollisionWorld::new(0.0, 0.0, false);
    world.query_circle_area(0.0, 0.0, 5.0, None);

    let mut renderer = RecordingRenderer::default();
    world.draw(&mut renderer, 1.0);
    assert_eq!(renderer.circles, 0);
}
