use scribe_engine::math::Vec2;
use scribe_engine::scene::{Circle, IdGenerator, Polyline, Rgb, Scene, Text};

/// Starting content: a polyline with joints, a few circles and a caption.
pub fn demo_scene(ids: &IdGenerator) -> Scene {
    let mut scene = Scene::new();

    let mut zigzag = Polyline::start(0, Vec2::new(-0.6, -0.3), Rgb::from_u8(240, 190, 60), ids);
    for point in [Vec2::new(-0.3, 0.3), Vec2::new(0.0, -0.3), Vec2::new(0.3, 0.3), Vec2::new(0.6, -0.3)] {
        zigzag.commit(point, ids);
    }
    scene.extend_lines(zigzag.finish());

    for (i, color) in [Rgb::new(0.9, 0.3, 0.3), Rgb::new(0.3, 0.8, 0.4), Rgb::new(0.3, 0.5, 0.95)]
        .into_iter()
        .enumerate()
    {
        let x = -0.4 + 0.4 * i as f32;
        scene.push(Circle::new(Vec2::new(x, 0.55), 0.08).with_color(color).with_id(ids.next_id()));
    }

    scene.push(
        Text::new(Vec2::new(-0.75, -0.65), "scribe\nclick to pick")
            .with_size(0.09)
            .with_id(ids.next_id()),
    );
    scene
}
