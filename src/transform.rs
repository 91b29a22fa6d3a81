//! The per-frame transform pipeline: interaction state in, one MVP matrix out.
//!
//! All matrices are column-major (glam's convention, and what the shader
//! uniform expects), so nothing is transposed before upload. In
//! column-vector notation the composition is
//!
//! ```text
//! mvp = projection * view * translation * (Rx * Ry * Rz) * scale
//! ```
//!
//! so a vertex is scaled first, then rotated, then translated, then viewed.
//!
//! ```
//! use cgview::{CameraMode, InteractionState, TransformPipeline, Viewport};
//!
//! let pipeline = TransformPipeline::new(CameraMode::Static, Viewport::new(500.0, 500.0));
//! let state = InteractionState::default();
//! assert_eq!(pipeline.mvp(&state), pipeline.mvp(&state));
//! ```

use glam::{Mat4, Vec3, Vec4};

use crate::config::CameraMode;
use crate::interaction::InteractionState;

/// Static viewport parameters for the projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Viewport {
    /// A viewport with the default clip planes (0.001 .. 50).
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            z_near: 0.001,
            z_far: 50.0,
        }
    }

    pub fn clip_planes(mut self, z_near: f32, z_far: f32) -> Self {
        self.z_near = z_near;
        self.z_far = z_far;
        self
    }

    /// Width over height. Callers keep `height > 0`.
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Elementary rotations about X, Y and Z composed as `Rx * Ry * Rz`.
///
/// Angles are in radians and right-handed. They accumulate without
/// wraparound; only their sine and cosine are used.
pub fn rotation_matrix(angles: Vec3) -> Mat4 {
    Mat4::from_rotation_x(angles.x) * Mat4::from_rotation_y(angles.y) * Mat4::from_rotation_z(angles.z)
}

/// Uniform scale on the diagonal.
pub fn scale_matrix(scale: f32) -> Mat4 {
    Mat4::from_scale(Vec3::splat(scale))
}

/// Identity with the offset in the last column.
pub fn translation_matrix(offset: Vec3) -> Mat4 {
    Mat4::from_translation(offset)
}

/// Model matrix for the current interaction state.
pub fn model_matrix(state: &InteractionState) -> Mat4 {
    translation_matrix(state.position_offset)
        * rotation_matrix(state.euler_angles)
        * scale_matrix(state.scale)
}

/// Right-handed perspective projection into wgpu clip space (depth 0..1).
///
/// `f = cot(fov_y / 2)` scales Y, and X by `f / aspect`. The third column's
/// `-1` in row 3 makes `w = -z_view`, so the hardware divide produces the
/// perspective foreshortening.
pub fn perspective_matrix(fov_y_radians: f32, aspect: f32, z_near: f32, z_far: f32) -> Mat4 {
    let f = 1.0 / (fov_y_radians / 2.0).tan();
    let depth = z_far / (z_near - z_far);

    Mat4::from_cols(
        Vec4::new(f / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, f, 0.0, 0.0),
        Vec4::new(0.0, 0.0, depth, -1.0),
        Vec4::new(0.0, 0.0, z_near * depth, 0.0),
    )
}

/// Maps interaction state to the matrix bound as the shader's `transform`.
#[derive(Clone, Copy, Debug)]
pub struct TransformPipeline {
    mode: CameraMode,
    viewport: Viewport,
}

impl TransformPipeline {
    pub fn new(mode: CameraMode, viewport: Viewport) -> Self {
        Self { mode, viewport }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Track a window resize. Zero-sized windows are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.viewport.width = width as f32;
            self.viewport.height = height as f32;
        }
    }

    /// View matrix for the configured camera mode.
    pub fn view(&self, state: &InteractionState) -> Mat4 {
        match self.mode {
            CameraMode::None => Mat4::IDENTITY,
            CameraMode::Static | CameraMode::Free => state.camera.view_matrix(),
        }
    }

    /// Projection matrix for the configured camera mode.
    pub fn projection(&self, state: &InteractionState) -> Mat4 {
        match self.mode {
            CameraMode::None => Mat4::IDENTITY,
            CameraMode::Static | CameraMode::Free => perspective_matrix(
                state.camera.fov.to_radians(),
                self.viewport.aspect(),
                self.viewport.z_near,
                self.viewport.z_far,
            ),
        }
    }

    /// The full model-view-projection matrix.
    ///
    /// A pure function of `state` and the viewport: nothing is cached between
    /// frames.
    pub fn mvp(&self, state: &InteractionState) -> Mat4 {
        self.projection(state) * self.view(state) * model_matrix(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert!(a.abs_diff_eq(b, 1e-5), "{a:?} != {b:?}");
    }

    #[test]
    fn mvp_is_deterministic() {
        let pipeline = TransformPipeline::new(CameraMode::Free, Viewport::new(640.0, 480.0));
        let mut state = InteractionState::default();
        state.position_offset = Vec3::new(0.3, -0.2, 0.7);
        state.euler_angles = Vec3::new(1.1, -0.4, 2.5);
        state.scale = 0.6;
        state.camera.look(40.0, -12.0, 0.05);

        let a = pipeline.mvp(&state);
        let b = pipeline.mvp(&state);
        assert_eq!(a.to_cols_array(), b.to_cols_array());
    }

    #[test]
    fn rotation_about_x_at_quarter_turns() {
        // (angle, expected image of +Y, expected image of +Z)
        let cases = [
            (0.0, Vec3::Y, Vec3::Z),
            (FRAC_PI_2, Vec3::Z, Vec3::NEG_Y),
            (PI, Vec3::NEG_Y, Vec3::NEG_Z),
        ];
        for (angle, y, z) in cases {
            let r = rotation_matrix(Vec3::new(angle, 0.0, 0.0));
            assert_vec_eq(r.transform_vector3(Vec3::X), Vec3::X);
            assert_vec_eq(r.transform_vector3(Vec3::Y), y);
            assert_vec_eq(r.transform_vector3(Vec3::Z), z);
        }
    }

    #[test]
    fn rotation_about_y_and_z_at_quarter_turn() {
        let ry = rotation_matrix(Vec3::new(0.0, FRAC_PI_2, 0.0));
        assert_vec_eq(ry.transform_vector3(Vec3::Z), Vec3::X);
        assert_vec_eq(ry.transform_vector3(Vec3::X), Vec3::NEG_Z);

        let rz = rotation_matrix(Vec3::new(0.0, 0.0, FRAC_PI_2));
        assert_vec_eq(rz.transform_vector3(Vec3::X), Vec3::Y);
        assert_vec_eq(rz.transform_vector3(Vec3::Y), Vec3::NEG_X);
    }

    #[test]
    fn rotations_compose_in_x_y_z_order() {
        let angles = Vec3::new(FRAC_PI_2, FRAC_PI_2, 0.0);
        let r = rotation_matrix(angles);
        // Rx * Ry applied to +X: Ry sends X to -Z, Rx sends -Z to +Y.
        assert_vec_eq(r.transform_vector3(Vec3::X), Vec3::Y);
        assert!(r.abs_diff_eq(
            Mat4::from_rotation_x(FRAC_PI_2) * Mat4::from_rotation_y(FRAC_PI_2),
            1e-6
        ));
    }

    #[test]
    fn model_matrix_scales_then_rotates_then_translates() {
        let mut state = InteractionState::default();
        state.scale = 2.0;
        state.euler_angles = Vec3::new(0.0, 0.0, FRAC_PI_2);
        state.position_offset = Vec3::new(1.0, 0.0, 0.0);

        let p = model_matrix(&state).transform_point3(Vec3::X);
        // scale: (2,0,0) -> rotate about Z: (0,2,0) -> translate: (1,2,0)
        assert_vec_eq(p, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn perspective_matches_glam() {
        let fov = 15.0_f32.to_radians();
        let ours = perspective_matrix(fov, 1.5, 0.1, 100.0);
        let glam = Mat4::perspective_rh(fov, 1.5, 0.1, 100.0);
        assert!(ours.abs_diff_eq(glam, 1e-4), "{ours:?} != {glam:?}");
    }

    #[test]
    fn perspective_uses_cotangent_over_aspect() {
        let fov = 15.0_f32.to_radians();
        let p = perspective_matrix(fov, 2.0, 0.001, 50.0);
        let cot = 1.0 / (fov / 2.0).tan();
        assert!((p.x_axis.x - cot / 2.0).abs() < 1e-4);
        assert!((p.y_axis.y - cot).abs() < 1e-4);
        assert_eq!(p.z_axis.w, -1.0);
        assert_eq!(p.w_axis.w, 0.0);
    }

    #[test]
    fn no_camera_mode_is_model_matrix_only() {
        let pipeline = TransformPipeline::new(CameraMode::None, Viewport::new(500.0, 500.0));
        let mut state = InteractionState::default();
        state.euler_angles.z = 0.3;
        state.position_offset = Vec3::new(0.1, 0.2, 0.0);
        assert_eq!(pipeline.mvp(&state), model_matrix(&state));
    }

    #[test]
    fn resize_ignores_zero_height() {
        let mut pipeline = TransformPipeline::new(CameraMode::Static, Viewport::new(500.0, 500.0));
        pipeline.resize(800, 0);
        assert_eq!(pipeline.viewport().aspect(), 1.0);
        pipeline.resize(800, 400);
        assert_eq!(pipeline.viewport().aspect(), 2.0);
    }

    #[test]
    fn origin_lands_in_front_of_static_camera() {
        let pipeline = TransformPipeline::new(CameraMode::Static, Viewport::new(500.0, 500.0));
        let state = InteractionState::default();
        let clip = pipeline.mvp(&state) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() < 1e-6 && ndc.y.abs() < 1e-6);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
