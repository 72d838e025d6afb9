//! Window ↔ world conversions for a perspective camera looking down -Z.

use super::{Vec2, Vec3};

/// Window x (pixels, left origin) to NDC `[-1, 1]`.
#[inline]
pub fn normalize_x(x: f32, width: f32) -> f32 {
    (x / width) * 2.0 - 1.0
}

/// Window y (pixels, top origin) to NDC `[-1, 1]`, +Y up.
#[inline]
pub fn normalize_y(y: f32, height: f32) -> f32 {
    -((y / height) * 2.0 - 1.0)
}

/// Direction of the vector `(dx, dy)` in degrees, in `[0, 360)`.
pub fn line_angle(dx: f32, dy: f32) -> f32 {
    let deg = dy.atan2(dx).to_degrees();
    if deg < 0.0 { deg + 360.0 } else { deg }
}

/// Camera parameters needed to unproject onto the painting layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub width: f32,
    pub height: f32,
}

/// Projects a window coordinate onto the plane `z = layer` seen from `camera`.
pub fn screen_to_world(window: Vec2, camera: Vec3, layer: f32, proj: Projection) -> Vec2 {
    let nx = normalize_x(window.x, proj.width);
    let ny = normalize_y(window.y, proj.height);

    let tan = (proj.fov_y / 2.0).tan();
    let distance = camera.z - layer;

    Vec2::new(
        camera.x + nx * proj.aspect * tan * distance,
        camera.y + ny * tan * distance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{to_radians, Mat4, Vec4};

    #[test]
    fn angle_covers_all_quadrants() {
        assert!((line_angle(1.0, 0.0) - 0.0).abs() < 1e-4);
        assert!((line_angle(0.0, 1.0) - 90.0).abs() < 1e-4);
        assert!((line_angle(-1.0, 0.0) - 180.0).abs() < 1e-4);
        assert!((line_angle(0.0, -1.0) - 270.0).abs() < 1e-4);
        assert!((line_angle(1.0, -1.0) - 315.0).abs() < 1e-4);
    }

    #[test]
    fn unprojection_round_trips_through_the_camera() {
        let proj = Projection { fov_y: to_radians(45.0), aspect: 1.5, width: 600.0, height: 400.0 };
        let camera = Vec3::new(0.25, -0.5, 1.0);
        let layer = -1.0;

        let world = screen_to_world(Vec2::new(450.0, 100.0), camera, layer, proj);

        let view = Mat4::translation(-camera.x, -camera.y, -camera.z);
        let p = Mat4::perspective(proj.fov_y, proj.aspect, 0.1, 10.0)
            * view
            * crate::math::Column4::from(Vec4::point(world.x, world.y, layer));
        let clip: Vec4 = p.into();

        assert!((clip.x / clip.w - normalize_x(450.0, 600.0)).abs() < 1e-4);
        assert!((clip.y / clip.w - normalize_y(100.0, 400.0)).abs() < 1e-4);
    }
}
