use std::path::PathBuf;
use std::sync::Arc;

use glam::Vec2;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowAttributes, WindowId};

use crate::camera::CameraState;
use crate::config::{CameraMode, Feature, ViewerConfig};
use crate::error::ViewerError;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::interaction::InteractionState;
use crate::mesh::GpuMesh;
use crate::model::Model;
use crate::renderer::ModelPass;
use crate::texture::{GpuTexture, GpuTextureStore};
use crate::transform::{TransformPipeline, Viewport};

/// Open the viewer window and run until it is closed.
///
/// `model_path` is required when the configuration loads models. Startup
/// failures come back as a [`ViewerError`] whose
/// [`exit_code`](ViewerError::exit_code) the binary reports.
pub fn run(config: ViewerConfig, model_path: Option<PathBuf>) -> Result<(), ViewerError> {
    if config.features.contains(Feature::ModelLoading) && model_path.is_none() {
        return Err(ViewerError::MissingModel);
    }

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = Viewer::Pending { config, model_path };
    event_loop.run_app(&mut app)?;

    match app {
        Viewer::Failed(error) => Err(error),
        _ => Ok(()),
    }
}

enum Viewer {
    Pending {
        config: ViewerConfig,
        model_path: Option<PathBuf>,
    },
    Running(Box<Running>),
    Failed(ViewerError),
    Finished,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    pass: ModelPass,
    meshes: Vec<GpuMesh>,
    input: Input,
    state: InteractionState,
    pipeline: TransformPipeline,
    config: ViewerConfig,
    capture: MouseCapture,
}

/// Cursor capture for mouse-look.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct MouseCapture {
    /// The camera is mouse driven, so the cursor is grabbed.
    enabled: bool,
    /// The cursor is locked and mouse-look reads raw device motion.
    locked: bool,
    focused: bool,
}

impl MouseCapture {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            locked: false,
            focused: true,
        }
    }

    fn takes_raw_motion(&self) -> bool {
        self.locked && self.focused
    }

    fn ignores_cursor_moved(&self) -> bool {
        self.locked
    }

    /// Record a focus change. Returns true when the cursor must be grabbed again.
    fn set_focused(&mut self, focused: bool) -> bool {
        let regained = focused && !self.focused;
        self.focused = focused;
        regained && self.enabled
    }
}

impl Running {
    fn start(
        event_loop: &ActiveEventLoop,
        config: ViewerConfig,
        model_path: Option<PathBuf>,
    ) -> Result<Self, ViewerError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let mut pass = ModelPass::new(&gpu);

        let (model, textures) = load_model(&gpu, &config, model_path)?;
        let meshes = pass.prepare(&gpu, &model, textures);
        log::debug!("{} GPU meshes, {} textures", meshes.len(), pass.texture_count());

        let mode = config.features.camera_mode();
        let mut capture = MouseCapture::new(mode == CameraMode::Free);
        if capture.enabled {
            capture.locked = grab_cursor(&window);
        }

        let viewport = Viewport::new(gpu.width() as f32, gpu.height() as f32)
            .clip_planes(config.z_near, config.z_far);
        let camera = CameraState::looking_at_origin(config.camera_distance, config.frustum_angle);

        Ok(Self {
            window,
            gpu,
            pass,
            meshes,
            input: Input::new(),
            state: InteractionState::new(camera, &config.steps),
            pipeline: TransformPipeline::new(mode, viewport),
            config,
            capture,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        self.pass.ensure_depth_size(&self.gpu);
        self.pipeline.resize(width, height);
    }

    fn redraw(&mut self) -> Result<(), ViewerError> {
        self.state
            .update(&self.input, self.config.features, &self.config.steps);
        let mvp = self.pipeline.mvp(&self.state);

        let frame = match self.gpu.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.gpu.reconfigure();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(ViewerError::OutOfMemory),
            Err(e) => {
                log::warn!("skipping frame: {e}");
                return Ok(());
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.pass.render(
            &self.gpu,
            &mut encoder,
            &view,
            &self.meshes,
            mvp,
            self.config.clear_color(),
        );

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}

fn load_model(
    gpu: &GpuContext,
    config: &ViewerConfig,
    model_path: Option<PathBuf>,
) -> Result<(Model, Vec<GpuTexture>), ViewerError> {
    let path = match model_path {
        Some(path) if config.features.contains(Feature::ModelLoading) => path,
        _ => return Ok((Model::pinwheel(), Vec::new())),
    };

    let loaded = if config.features.contains(Feature::TextureMapping) {
        let mut store = GpuTextureStore::new(gpu);
        Model::load(&path, &mut store).map(|model| (model, store.into_textures()))
    } else {
        Model::load_untextured(&path).map(|model| (model, Vec::new()))
    };

    loaded.map_err(|source| ViewerError::ModelLoad { path, source })
}

// Lock the cursor for mouse-look, falling back to confining it.
// Returns true when locked, meaning positions stop and raw motion must be used.
fn grab_cursor(window: &Window) -> bool {
    let locked = match window.set_cursor_grab(CursorGrabMode::Locked) {
        Ok(()) => true,
        Err(_) => {
            if let Err(e) = window.set_cursor_grab(CursorGrabMode::Confined) {
                log::warn!("could not grab cursor: {e}");
            }
            false
        }
    };
    window.set_cursor_visible(false);
    locked
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !matches!(self, Viewer::Pending { .. }) {
            return;
        }
        let Viewer::Pending { config, model_path } = std::mem::replace(self, Viewer::Finished)
        else {
            return;
        };

        match Running::start(event_loop, config, model_path) {
            Ok(running) => {
                running.window.request_redraw();
                *self = Viewer::Running(Box::new(running));
            }
            Err(e) => {
                *self = Viewer::Failed(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Viewer::Running(running) = self else {
            return;
        };

        if !(running.capture.ignores_cursor_moved()
            && matches!(event, WindowEvent::CursorMoved { .. }))
        {
            running.input.handle_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event: key, .. }
                if key.state == ElementState::Pressed
                    && key.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => running.resize(size.width, size.height),
            WindowEvent::Focused(focused) => {
                if running.capture.set_focused(focused) {
                    running.capture.locked = grab_cursor(&running.window);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = running.redraw() {
                    *self = Viewer::Failed(e);
                    event_loop.exit();
                    return;
                }
                running.input.begin_frame();
                running.window.request_redraw();
            }
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        let Viewer::Running(running) = self else {
            return;
        };
        if let DeviceEvent::MouseMotion { delta } = event {
            if running.capture.takes_raw_motion() {
                running
                    .input
                    .add_motion(Vec2::new(delta.0 as f32, delta.1 as f32));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_variant_without_path_is_missing_model() {
        let result = run(ViewerConfig::new(), None);
        assert!(matches!(result, Err(ViewerError::MissingModel)));
        assert_eq!(ViewerError::MissingModel.exit_code(), -1);
    }

    #[test]
    fn raw_motion_ignored_while_unfocused() {
        let mut capture = MouseCapture::new(true);
        capture.locked = true;
        assert!(capture.takes_raw_motion());

        assert!(!capture.set_focused(false));
        assert!(!capture.takes_raw_motion());
        assert!(capture.ignores_cursor_moved());
    }

    #[test]
    fn regaining_focus_requests_grab() {
        let mut capture = MouseCapture::new(true);
        assert!(!capture.set_focused(true));
        capture.set_focused(false);
        assert!(capture.set_focused(true));
        assert!(!capture.set_focused(true));
    }

    #[test]
    fn static_camera_never_grabs() {
        let mut capture = MouseCapture::new(false);
        capture.set_focused(false);
        assert!(!capture.set_focused(true));
        assert!(!capture.takes_raw_motion());
        assert!(!capture.ignores_cursor_moved());
    }
}
