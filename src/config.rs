//! Viewer configuration: window, feature set, clip planes and input step sizes.
//!
//! A single renderer is driven by a [`FeatureSet`]. [`Variant`] names the
//! presets exposed on the command line.

/// Individual renderer features.
///
/// Combine them into a [`FeatureSet`] with `|`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Fixed camera looking down -Z.
    StaticCamera,
    /// Mouse-look camera with scroll-wheel zoom.
    FreeCamera,
    /// Geometry comes from a model file instead of the built-in pinwheel.
    ModelLoading,
    /// Material diffuse textures are loaded and sampled.
    TextureMapping,
    /// Continuous rotation about Z, Space pauses, E/Q change speed.
    AutoRotate,
}

impl Feature {
    const fn bit(self) -> u8 {
        match self {
            Feature::StaticCamera => 1 << 0,
            Feature::FreeCamera => 1 << 1,
            Feature::ModelLoading => 1 << 2,
            Feature::TextureMapping => 1 << 3,
            Feature::AutoRotate => 1 << 4,
        }
    }
}

/// A small set of [`Feature`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FeatureSet {
    bits: u8,
}

impl FeatureSet {
    /// No features: clip-space rendering of the built-in geometry.
    pub const EMPTY: Self = Self { bits: 0 };

    pub const fn of(features: &[Feature]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < features.len() {
            bits |= features[i].bit();
            i += 1;
        }
        Self { bits }
    }

    pub const fn contains(&self, feature: Feature) -> bool {
        self.bits & feature.bit() != 0
    }

    pub fn insert(&mut self, feature: Feature) {
        self.bits |= feature.bit();
    }

    pub fn remove(&mut self, feature: Feature) {
        self.bits &= !feature.bit();
    }

    /// Which camera drives the view and projection matrices.
    ///
    /// `FreeCamera` wins when both camera features are set.
    pub fn camera_mode(&self) -> CameraMode {
        if self.contains(Feature::FreeCamera) {
            CameraMode::Free
        } else if self.contains(Feature::StaticCamera) {
            CameraMode::Static
        } else {
            CameraMode::None
        }
    }
}

impl std::ops::BitOr<Feature> for FeatureSet {
    type Output = FeatureSet;

    fn bitor(mut self, rhs: Feature) -> FeatureSet {
        self.insert(rhs);
        self
    }
}

impl std::fmt::Debug for FeatureSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const ALL: [Feature; 5] = [
            Feature::StaticCamera,
            Feature::FreeCamera,
            Feature::ModelLoading,
            Feature::TextureMapping,
            Feature::AutoRotate,
        ];
        f.debug_set()
            .entries(ALL.iter().filter(|feature| self.contains(**feature)))
            .finish()
    }
}

/// How the view and projection part of the MVP matrix is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CameraMode {
    /// No camera: vertices are already in clip space.
    None,
    /// Fixed eye on +Z looking at the origin.
    Static,
    /// Yaw/pitch driven by the mouse, fov by the scroll wheel.
    Free,
}

/// Named feature presets selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Variant {
    /// Spinning built-in pinwheel, no camera.
    Pinwheel,
    /// OBJ/STL model with a fixed camera.
    #[default]
    Model,
    /// OBJ/STL model with mouse-look.
    FreeLook,
}

impl Variant {
    pub fn features(self) -> FeatureSet {
        match self {
            Variant::Pinwheel => FeatureSet::of(&[Feature::AutoRotate]),
            Variant::Model => FeatureSet::of(&[
                Feature::StaticCamera,
                Feature::ModelLoading,
                Feature::TextureMapping,
            ]),
            Variant::FreeLook => FeatureSet::of(&[
                Feature::FreeCamera,
                Feature::ModelLoading,
                Feature::TextureMapping,
            ]),
        }
    }
}

/// Per-frame increments applied while a key is held.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Steps {
    /// Translation per frame (W/A/S/D).
    pub translate: f32,
    /// Rotation per frame in radians (X/Y/Z).
    pub rotate: f32,
    /// Scale change per frame (M/N).
    pub scale: f32,
    /// Initial auto-rotation speed in radians per frame.
    pub spin: f32,
    /// Auto-rotation speed change per frame (E/Q).
    pub spin_accel: f32,
    /// Mouse-look sensitivity in degrees per pixel.
    pub mouse_sensitivity: f32,
    /// Field-of-view change in degrees per scroll line.
    pub zoom: f32,
}

impl Default for Steps {
    fn default() -> Self {
        Self {
            translate: 0.01,
            rotate: 0.05,
            scale: 0.025,
            spin: 0.01,
            spin_accel: 0.00003,
            mouse_sensitivity: 0.05,
            zoom: 5.0,
        }
    }
}

impl Steps {
    /// Above this scale, N shrinks by a full step; at or below, by a fifth.
    pub fn scale_threshold(&self) -> f32 {
        15.0 * self.scale
    }

    /// N never shrinks the model at or below this scale.
    pub fn scale_floor(&self) -> f32 {
        self.scale / 5.0
    }
}

/// Everything the viewer needs to start.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub features: FeatureSet,
    pub z_near: f32,
    pub z_far: f32,
    /// Vertical field of view in degrees.
    pub frustum_angle: f32,
    /// Distance of the eye from the origin along +Z.
    pub camera_distance: f32,
    pub steps: Steps,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "cgview".to_string(),
            width: 500,
            height: 500,
            features: Variant::default().features(),
            z_near: 0.001,
            z_far: 50.0,
            frustum_angle: 15.0,
            camera_distance: 1.0,
            steps: Steps::default(),
        }
    }
}

impl ViewerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn features(mut self, features: FeatureSet) -> Self {
        self.features = features;
        self
    }

    pub fn clip_planes(mut self, z_near: f32, z_far: f32) -> Self {
        self.z_near = z_near;
        self.z_far = z_far;
        self
    }

    pub fn frustum_angle(mut self, degrees: f32) -> Self {
        self.frustum_angle = degrees;
        self
    }

    pub fn camera_distance(mut self, distance: f32) -> Self {
        self.camera_distance = distance;
        self
    }

    /// Background colour for the configured feature set.
    pub fn clear_color(&self) -> wgpu::Color {
        if self.features.contains(Feature::ModelLoading) {
            wgpu::Color {
                r: 0.7,
                g: 0.7,
                b: 0.7,
                a: 1.0,
            }
        } else {
            wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.5,
                a: 1.0,
            }
        }
    }
}
