//! # cgview
//!
//! **A small real-time model viewer driven by the keyboard and mouse.**
//!
//! Two pieces do the work:
//!
//! - the **transform pipeline** turns the current [`InteractionState`] into
//!   one model-view-projection matrix per frame ([`TransformPipeline`]);
//! - the **asset cache** loads OBJ and STL models into [`Model`]s, uploading
//!   each texture file only once ([`TextureCache`]).
//!
//! Everything else is the wgpu and winit plumbing around them: a window, one
//! render pass and a per-frame input step. [`run`] puts it together.
//!
//! ```no_run
//! use cgview::{Variant, ViewerConfig, run};
//!
//! let config = ViewerConfig::new().features(Variant::Model.features());
//! if let Err(e) = run(config, Some("assets/teapot.obj".into())) {
//!     std::process::exit(e.exit_code());
//! }
//! ```

mod app;
mod camera;
mod config;
mod error;
mod geometry;
mod gpu;
mod input;
mod interaction;
pub mod logging;
mod mesh;
mod model;
mod renderer;
mod texture;
mod transform;

pub use app::run;
pub use camera::{CameraState, FOV_RANGE, PITCH_LIMIT, WORLD_UP, view_matrix};
pub use config::{CameraMode, Feature, FeatureSet, Steps, Variant, ViewerConfig};
pub use error::{AssetError, ViewerError};
pub use geometry::{RawMesh, load_meshes, load_obj, load_stl};
pub use gpu::GpuContext;
pub use input::Input;
pub use interaction::{AutoSpin, InteractionState};
pub use mesh::{Bounds2, GpuMesh, Mesh, MeshUniforms, Vertex};
pub use model::{DEFAULT_COLOR, Model, NoTextures, Texture, TextureCache, TextureId, TextureSource};
pub use renderer::ModelPass;
pub use texture::{GpuTexture, GpuTextureStore, decode, mip_chain, mip_level_count};
pub use transform::{
    TransformPipeline, Viewport, model_matrix, perspective_matrix, rotation_matrix, scale_matrix,
    translation_matrix,
};

// Re-export glam math types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
