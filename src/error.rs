//! Error types for asset loading and viewer startup.

use std::path::PathBuf;

/// Errors that can occur while loading a model or one of its textures.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// File could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The OBJ parser rejected the file.
    #[error("OBJ parse error: {0}")]
    Obj(#[from] tobj::LoadError),
    /// The STL parser rejected the file.
    #[error("STL parse error: {0}")]
    Stl(String),
    /// File format could not be determined from the extension.
    #[error("Unknown geometry format: '{0}'")]
    UnknownFormat(String),
    /// The image could not be decoded.
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),
}

/// Fatal errors raised while bringing the viewer up.
///
/// Each variant maps to a distinct process exit code via [`ViewerError::exit_code`].
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("a model file is required for this variant")]
    MissingModel,
    #[error("failed to start the event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("failed to find a suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("GPU ran out of memory acquiring a frame")]
    OutOfMemory,
    #[error("failed to load model {path:?}: {source}")]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: AssetError,
    },
}

impl ViewerError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ViewerError::MissingModel
            | ViewerError::EventLoop(_)
            | ViewerError::WindowCreation(_) => -1,
            ViewerError::Surface(_)
            | ViewerError::Adapter(_)
            | ViewerError::Device(_)
            | ViewerError::OutOfMemory => -2,
            ViewerError::ModelLoad { .. } => -3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_cause() {
        assert_eq!(ViewerError::MissingModel.exit_code(), -1);
        assert_eq!(ViewerError::OutOfMemory.exit_code(), -2);

        let load = ViewerError::ModelLoad {
            path: PathBuf::from("missing.obj"),
            source: AssetError::UnknownFormat("fbx".into()),
        };
        assert_eq!(load.exit_code(), -3);
        assert!(load.to_string().contains("missing.obj"));
    }
}
