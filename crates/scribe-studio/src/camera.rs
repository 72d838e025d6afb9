use std::collections::HashSet;

use scribe_engine::math::{Mat4, Vec3, to_radians};
use winit::keyboard::KeyCode;

/// View translation range along z.
const MIN_Z: f32 = -2.8;
const MAX_Z: f32 = 6.0;
/// Smallest per-frame step, reached at the far end of the range.
const MIN_STEP: f32 = 0.005;

/// Keyboard-driven camera.
///
/// Stores the view translation rather than the eye: `D`/`A` and
/// `Space`/`Z` pan the scene along x and y, `W`/`S` move it along z. The
/// step eases with depth.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera {
    offset: Vec3,
}

impl Camera {
    pub fn at(eye: Vec3) -> Self {
        Self { offset: Vec3::new(-eye.x, -eye.y, -eye.z) }
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(-self.offset.x, -self.offset.y, -self.offset.z)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::translation(self.offset.x, self.offset.y, self.offset.z)
    }

    pub fn step(&self) -> f32 {
        let angle = (self.offset.z - MIN_Z) / 9.0 * 8.0 + 281.0;
        (to_radians(angle).sin() + 1.0).max(MIN_STEP)
    }

    /// Applies one frame of movement for the held keys.
    ///
    /// The painting `layer` is kept at least `near` in front of the eye.
    /// Returns whether the camera moved.
    pub fn update(&mut self, held: &HashSet<KeyCode>, layer: f32, near: f32) -> bool {
        let before = self.offset;
        let step = self.step();
        let max_z = MAX_Z.min(-layer - near);

        if held.contains(&KeyCode::KeyW) {
            self.offset.z = (self.offset.z - step).max(MIN_Z);
        }
        if held.contains(&KeyCode::KeyS) {
            self.offset.z = (self.offset.z + step).min(max_z);
        }
        if held.contains(&KeyCode::KeyD) {
            self.offset.x += step;
        }
        if held.contains(&KeyCode::KeyA) {
            self.offset.x -= step;
        }
        if held.contains(&KeyCode::Space) {
            self.offset.y += step;
        }
        if held.contains(&KeyCode::KeyZ) {
            self.offset.y -= step;
        }

        self.offset != before
    }

    pub fn is_navigation_key(code: KeyCode) -> bool {
        matches!(
            code,
            KeyCode::KeyW | KeyCode::KeyS | KeyCode::KeyA | KeyCode::KeyD | KeyCode::Space | KeyCode::KeyZ
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[KeyCode]) -> HashSet<KeyCode> {
        keys.iter().copied().collect()
    }

    #[test]
    fn eye_and_view_are_inverse_translations() {
        let camera = Camera::at(Vec3::new(0.5, -0.25, 1.0));
        assert_eq!(camera.eye(), Vec3::new(0.5, -0.25, 1.0));
        assert_eq!(camera.view(), Mat4::translation(-0.5, 0.25, -1.0));
    }

    #[test]
    fn no_keys_leave_the_camera_alone() {
        let mut camera = Camera::at(Vec3::new(0.0, 0.0, 1.0));
        assert!(!camera.update(&HashSet::new(), -1.0, 0.1));
        assert_eq!(camera.eye(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn pan_moves_by_one_step() {
        let mut camera = Camera::at(Vec3::new(0.0, 0.0, 1.0));
        let step = camera.step();
        assert!(step > MIN_STEP);

        assert!(camera.update(&held(&[KeyCode::KeyD, KeyCode::Space]), -1.0, 0.1));
        let eye = camera.eye();
        assert!((eye.x + step).abs() < 1e-6);
        assert!((eye.y + step).abs() < 1e-6);
        assert_eq!(eye.z, 1.0);
    }

    #[test]
    fn zoom_is_clamped_at_both_ends() {
        let mut camera = Camera::at(Vec3::new(0.0, 0.0, 1.0));
        for _ in 0..10_000 {
            camera.update(&held(&[KeyCode::KeyW]), -1.0, 0.1);
        }
        assert_eq!(camera.eye().z, -MIN_Z);
        assert!(!camera.update(&held(&[KeyCode::KeyW]), -1.0, 0.1));

        for _ in 0..10_000 {
            camera.update(&held(&[KeyCode::KeyS]), -1.0, 0.1);
        }
        // Stops short of MAX_Z so the layer at -1 stays in front of the eye.
        assert!((camera.eye().z - (-1.0 + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn step_eases_with_depth() {
        let near = Camera::at(Vec3::new(0.0, 0.0, 1.0)).step();
        let far = Camera::at(Vec3::new(0.0, 0.0, 2.8)).step();
        assert!(far < near);
        assert!(far >= MIN_STEP);
    }
}
