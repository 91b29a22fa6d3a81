//! Camera state for the view half of the transform pipeline.
//!
//! [`CameraState`] is owned by the interaction state and mutated only by the
//! input step. It covers both camera modes: the static camera never changes
//! its angles, the free camera turns with the mouse and zooms with the wheel.

use glam::{Mat4, Vec3, Vec4};

/// Pitch is kept strictly inside the poles to avoid the view flipping.
pub const PITCH_LIMIT: f32 = 89.0;

/// Allowed field of view range in degrees.
pub const FOV_RANGE: (f32, f32) = (1.0, 90.0);

/// World up used to derive the camera basis.
pub const WORLD_UP: Vec3 = Vec3::Y;

/// Eye position, orientation and field of view.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    /// Eye position in world space.
    pub eye: Vec3,
    /// Horizontal angle in degrees. -90 looks down -Z.
    pub yaw: f32,
    /// Vertical angle in degrees, positive looks up.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::looking_at_origin(1.0, 15.0)
    }
}

impl CameraState {
    /// Eye on +Z at `distance`, looking at the origin.
    pub fn looking_at_origin(distance: f32, fov: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, distance),
            yaw: -90.0,
            pitch: 0.0,
            fov: fov.clamp(FOV_RANGE.0, FOV_RANGE.1),
        }
    }

    /// Turn the camera by a cursor movement in pixels.
    ///
    /// Moving the cursor up (negative `dy` in window coordinates) pitches up.
    pub fn look(&mut self, dx: f32, dy: f32, sensitivity: f32) {
        self.yaw += dx * sensitivity;
        self.pitch = (self.pitch - dy * sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Narrow or widen the field of view by a scroll amount in lines.
    pub fn zoom(&mut self, scroll: f32, step: f32) {
        self.fov = (self.fov - step * scroll).clamp(FOV_RANGE.0, FOV_RANGE.1);
    }

    /// Unit look direction from yaw and pitch.
    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    /// World-to-view matrix for the current eye and orientation.
    pub fn view_matrix(&self) -> Mat4 {
        view_matrix(self.eye, self.forward())
    }
}

/// Builds a right-handed view matrix from an eye position and a look direction.
///
/// The camera basis is `n` (pointing back out of the screen), `u` (right) and
/// `v` (up). `u` comes from a cross product with [`WORLD_UP`] and must be
/// re-normalized; `v` is then unit length by construction.
pub fn view_matrix(eye: Vec3, forward: Vec3) -> Mat4 {
    let n = -forward.normalize();
    let u = WORLD_UP.cross(n).normalize();
    let v = n.cross(u);

    Mat4::from_cols(
        Vec4::new(u.x, v.x, n.x, 0.0),
        Vec4::new(u.y, v.y, n.y, 0.0),
        Vec4::new(u.z, v.z, n.z, 0.0),
        Vec4::new(-u.dot(eye), -v.dot(eye), -n.dot(eye), 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat_eq(a: Mat4, b: Mat4) {
        assert!(a.abs_diff_eq(b, 1e-5), "\n{a:?}\n!=\n{b:?}");
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let camera = CameraState::default();
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn view_matrix_matches_glam_look_to() {
        let eye = Vec3::new(0.5, -1.0, 3.0);
        let forward = Vec3::new(0.3, 0.2, -1.0).normalize();
        assert_mat_eq(view_matrix(eye, forward), Mat4::look_to_rh(eye, forward, WORLD_UP));
    }

    #[test]
    fn static_view_moves_world_away_from_eye() {
        let camera = CameraState::looking_at_origin(1.0, 15.0);
        let origin = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!(origin.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn pitch_stays_clamped_after_any_mouse_sequence() {
        let mut camera = CameraState::default();
        let moves = [
            (0.0, -10_000.0),
            (35.0, 2_500.0),
            (-3.0, 99_999.0),
            (12.0, -1.0),
            (0.0, -4_000.0),
        ];
        for (dx, dy) in moves {
            camera.look(dx, dy, 0.05);
            assert!((-PITCH_LIMIT..=PITCH_LIMIT).contains(&camera.pitch));
        }
        assert_eq!(camera.pitch, PITCH_LIMIT);
    }

    #[test]
    fn moving_cursor_up_pitches_up() {
        let mut camera = CameraState::default();
        camera.look(0.0, -20.0, 0.05);
        assert!((camera.pitch - 1.0).abs() < 1e-6);
        assert!(camera.forward().y > 0.0);
    }

    #[test]
    fn scroll_zooms_and_clamps_fov() {
        let mut camera = CameraState::default();
        camera.zoom(1.0, 5.0);
        assert!((camera.fov - 10.0).abs() < 1e-6);
        camera.zoom(10.0, 5.0);
        assert_eq!(camera.fov, FOV_RANGE.0);
        camera.zoom(-100.0, 5.0);
        assert_eq!(camera.fov, FOV_RANGE.1);
    }
}
