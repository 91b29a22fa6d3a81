//! User-driven interaction state and the once-per-frame input step.
//!
//! [`InteractionState`] is the only mutable input to the transform pipeline.
//! [`InteractionState::update`] applies the keyboard and mouse contract for the
//! active [`FeatureSet`] by fixed per-frame increments.

use glam::Vec3;
use winit::keyboard::KeyCode;

use crate::camera::CameraState;
use crate::config::{CameraMode, Feature, FeatureSet, Steps};
use crate::input::Input;

/// Automatic rotation about Z for the pinwheel variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AutoSpin {
    /// Radians added to the Z angle each unpaused frame.
    pub speed: f32,
    pub paused: bool,
}

/// Translation, rotation, scale and camera parameters driven by the user.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionState {
    pub position_offset: Vec3,
    /// Rotation about X, Y and Z in radians.
    pub euler_angles: Vec3,
    pub scale: f32,
    pub camera: CameraState,
    pub spin: AutoSpin,
}

impl Default for InteractionState {
    fn default() -> Self {
        Self {
            position_offset: Vec3::ZERO,
            euler_angles: Vec3::ZERO,
            scale: 1.0,
            camera: CameraState::default(),
            spin: AutoSpin {
                speed: Steps::default().spin,
                paused: false,
            },
        }
    }
}

impl InteractionState {
    /// Initial state with the camera placed per the configuration.
    pub fn new(camera: CameraState, steps: &Steps) -> Self {
        Self {
            camera,
            spin: AutoSpin {
                speed: steps.spin,
                paused: false,
            },
            ..Self::default()
        }
    }

    /// Grow the model by one step.
    pub fn increase_scale(&mut self, steps: &Steps) {
        self.scale += steps.scale;
    }

    /// Shrink the model by one step, slowing down near zero.
    ///
    /// Above the threshold a full step is removed, at or below it a fifth of a
    /// step, and at or below the floor nothing. The scale therefore never
    /// reaches zero or goes negative.
    pub fn decrease_scale(&mut self, steps: &Steps) {
        if self.scale <= steps.scale_floor() {
            return;
        }
        if self.scale > steps.scale_threshold() {
            self.scale -= steps.scale;
        } else {
            self.scale -= steps.scale_floor();
        }
    }

    /// Apply one frame of input.
    pub fn update(&mut self, input: &Input, features: FeatureSet, steps: &Steps) {
        if features.contains(Feature::AutoRotate) {
            self.update_spin(input, steps);
            self.update_planar_translation(input, steps);
            return;
        }

        self.update_translation(input, steps);
        self.update_rotation(input, steps);

        if input.key_down(KeyCode::KeyM) {
            self.increase_scale(steps);
        }
        if input.key_down(KeyCode::KeyN) {
            self.decrease_scale(steps);
        }

        if features.camera_mode() == CameraMode::Free {
            let delta = input.mouse_delta();
            if delta != glam::Vec2::ZERO {
                self.camera.look(delta.x, delta.y, steps.mouse_sensitivity);
            }
            let scroll = input.scroll_delta().y;
            if scroll != 0.0 {
                self.camera.zoom(scroll, steps.zoom);
            }
        }
    }

    fn update_rotation(&mut self, input: &Input, steps: &Steps) {
        let sign = if input.shift_down() { -1.0 } else { 1.0 };
        let axes = [
            (KeyCode::KeyX, Vec3::X),
            (KeyCode::KeyY, Vec3::Y),
            (KeyCode::KeyZ, Vec3::Z),
        ];
        for (key, axis) in axes {
            if input.key_down(key) {
                self.euler_angles += axis * (sign * steps.rotate);
            }
        }
    }

    // W/S move in depth. Shift adds a vertical step, W taking precedence over S.
    fn update_translation(&mut self, input: &Input, steps: &Steps) {
        let forward = input.key_down(KeyCode::KeyW);
        let back = input.key_down(KeyCode::KeyS);
        if forward {
            self.position_offset.z += steps.translate;
        }
        if back {
            self.position_offset.z -= steps.translate;
        }
        if input.shift_down() {
            if forward {
                self.position_offset.y += steps.translate;
            } else if back {
                self.position_offset.y -= steps.translate;
            }
        }
        self.update_sideways(input, steps);
    }

    fn update_planar_translation(&mut self, input: &Input, steps: &Steps) {
        if input.key_down(KeyCode::KeyW) {
            self.position_offset.y += steps.translate;
        }
        if input.key_down(KeyCode::KeyS) {
            self.position_offset.y -= steps.translate;
        }
        self.update_sideways(input, steps);
    }

    fn update_sideways(&mut self, input: &Input, steps: &Steps) {
        if input.key_down(KeyCode::KeyA) {
            self.position_offset.x -= steps.translate;
        }
        if input.key_down(KeyCode::KeyD) {
            self.position_offset.x += steps.translate;
        }
    }

    fn update_spin(&mut self, input: &Input, steps: &Steps) {
        if input.key_pressed(KeyCode::Space) {
            self.spin.paused = !self.spin.paused;
        }
        if self.spin.paused {
            return;
        }
        if input.key_down(KeyCode::KeyE) {
            self.spin.speed += steps.spin_accel;
        }
        if input.key_down(KeyCode::KeyQ) {
            self.spin.speed -= steps.spin_accel;
        }
        self.euler_angles.z += self.spin.speed;
    }
}
