//! Windowed wgpu front end for the pointer-reactive gradient field.
//!
//! ```text
//!   fluidgrad CLI
//!          │ RendererConfig            ParamHandle (console, other threads)
//!          ▼                                  │
//!   Renderer::run ──▶ WindowState ──▶ winit event loop
//!                         │                   │ RedrawRequested
//!                         ▼                   ▼
//!                  FrameScheduler::tick ◀── ParamInbox
//!                         │
//!                         ├─▶ GpuState::simulate  (previous ─▶ current target)
//!                         └─▶ GpuState::display   (current target ─▶ surface)
//! ```
//!
//! `fieldcore` owns every decision about what runs when; this crate supplies
//! the window, the surface and the two GLSL programs.

mod compile;
mod gpu;
mod pacer;
mod types;
mod window;

use anyhow::Result;
use fieldcore::{param_channel, ParamHandle, ParamInbox};

pub use gpu::{FieldTexture, GpuState};
pub use types::{AdapterProfile, GpuPowerPreference, RendererConfig};

/// Entry point used by the CLI.
pub struct Renderer {
    config: RendererConfig,
    handle: ParamHandle,
    inbox: ParamInbox,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        let (handle, inbox) = param_channel();
        Self {
            config,
            handle,
            inbox,
        }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Handle for changing parameters while the window runs. Changes land at
    /// the start of the next frame.
    pub fn param_handle(&self) -> ParamHandle {
        self.handle.clone()
    }

    /// Opens the window and blocks until it closes.
    pub fn run(self) -> Result<()> {
        tracing::debug!(
            width = self.config.surface_size.0,
            height = self.config.surface_size.1,
            target_fps = ?self.config.target_fps,
            "starting renderer"
        );
        window::run_window(self.config, self.inbox)
    }
}
