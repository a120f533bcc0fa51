use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{error, info, trace, warn};
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{Event, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use fieldconfig::HighlightConfig;
use fieldcore::{FrameScheduler, ParamInbox, PointerKind, ResizeRequest, SurfaceSize};

use crate::gpu::{FieldTexture, GpuState};
use crate::pacer::FramePacer;
use crate::types::RendererConfig;

const SOFTWARE_FPS_CAP: f32 = 15.0;

/// Window, GPU kernel and scheduler for the interactive field.
///
/// `gpu` is declared before `window` so the surface is dropped while the
/// window it was created from is still alive.
pub(crate) struct WindowState {
    gpu: GpuState,
    scheduler: FrameScheduler<FieldTexture>,
    window: Arc<Window>,
    pacer: FramePacer,
    highlight: HighlightConfig,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig, inbox: ParamInbox) -> Result<Self> {
        let physical = window.inner_size();
        let mut gpu = GpuState::new(
            window.as_ref(),
            SurfaceSize::new(physical.width.max(1), physical.height.max(1)),
            config,
        )?;
        let initial = resize_request(physical, window.scale_factor());
        let scheduler =
            FrameScheduler::new(config.params.clone(), config.options, initial, &mut gpu)
                .with_inbox(inbox);

        let mut target_fps = config.target_fps;
        let profile = gpu.adapter_profile();
        if profile.is_software() && target_fps.is_none() {
            warn!(
                adapter = %profile.name,
                backend = ?profile.backend,
                cap = SOFTWARE_FPS_CAP,
                "software rasterizer detected; capping to {} FPS (override with --fps)",
                SOFTWARE_FPS_CAP
            );
            target_fps = Some(SOFTWARE_FPS_CAP);
        }

        Ok(Self {
            gpu,
            scheduler,
            window,
            pacer: FramePacer::new(target_fps),
            highlight: config.highlight.clone(),
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>, kind: PointerKind) {
        let scale = self.window.scale_factor();
        let logical = position.to_logical::<f64>(scale);
        let height = self.window.inner_size().to_logical::<f64>(scale).height;
        // Field coordinates grow upwards.
        let flipped = [logical.x as f32, (height - logical.y) as f32];
        self.scheduler.pointer_moved(flipped, kind, Instant::now());
    }

    fn touch(&mut self, touch: Touch) {
        match touch.phase {
            TouchPhase::Started | TouchPhase::Moved => {
                self.cursor_moved(touch.location, PointerKind::Touch)
            }
            TouchPhase::Ended | TouchPhase::Cancelled => self.scheduler.pointer_left(),
        }
    }

    fn resized(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        if size.width == 0 || size.height == 0 {
            trace!("ignoring zero-sized resize");
            return;
        }
        self.scheduler.request_resize(resize_request(size, scale_factor));
    }

    fn focus_changed(&mut self, focused: bool) {
        if !self.highlight.on_focus {
            return;
        }
        let multiple = if focused { self.highlight.multiple } else { 1.0 };
        self.scheduler.ease_intensity(
            multiple,
            self.highlight.duration,
            self.highlight.easing,
            Instant::now(),
        );
    }

    /// Runs one tick. Returns false when the loop should stop.
    fn redraw(&mut self) -> bool {
        let now = Instant::now();
        if !self.pacer.should_render(now) {
            return true;
        }
        match self.scheduler.tick(now, &mut self.gpu) {
            Ok(report) => {
                trace!(
                    frame = report.clock.frame,
                    pointer_active = report.pointer_active,
                    soft_reset = report.soft_reset,
                    "frame presented"
                );
                true
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                warn!("surface lost or outdated; reconfiguring");
                self.gpu.reconfigure();
                true
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; exiting");
                false
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
                true
            }
            Err(other) => {
                warn!("surface error: {other:?}; retrying next frame");
                true
            }
        }
    }
}

/// Converts a physical window size into the logical request the scheduler
/// resolves against the density cap.
fn resize_request(size: PhysicalSize<u32>, scale_factor: f64) -> ResizeRequest {
    let logical: LogicalSize<f64> = size.to_logical(scale_factor);
    ResizeRequest::logical(logical.width as f32, logical.height as f32)
        .with_scale(scale_factor as f32)
}

pub(crate) fn run_window(config: RendererConfig, inbox: ParamInbox) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(LogicalSize::new(width.max(1), height.max(1)))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config, inbox)
        .map_err(|err| anyhow!("failed to initialise window renderer: {err}"))?;
    info!(
        adapter = %state.gpu.adapter_profile().name,
        surface_width = state.gpu.surface_size().width,
        surface_height = state.gpu.surface_size().height,
        "field renderer ready"
    );
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        info!(frames = state.scheduler.frames(), "window closed");
                        elwt.exit();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        state.cursor_moved(position, PointerKind::Mouse);
                    }
                    WindowEvent::CursorLeft { .. } => state.scheduler.pointer_left(),
                    WindowEvent::Touch(touch) => state.touch(touch),
                    WindowEvent::Resized(size) => {
                        let scale = state.window().scale_factor();
                        state.resized(size, scale);
                    }
                    WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                        let size = state.window().inner_size();
                        state.resized(size, scale_factor);
                    }
                    WindowEvent::Focused(focused) => state.focus_changed(focused),
                    WindowEvent::RedrawRequested => {
                        if !state.redraw() {
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                match state.pacer.next_deadline(now) {
                    Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
                    None => {
                        state.window().request_redraw();
                        elwt.set_control_flow(ControlFlow::Wait);
                    }
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_requests_are_logical() {
        let request = resize_request(PhysicalSize::new(2560, 1440), 2.0);
        assert_eq!(request.width, 1280.0);
        assert_eq!(request.height, 720.0);
        assert_eq!(request.scale_factor, 2.0);
    }
}
