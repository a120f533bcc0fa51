use std::time::{Duration, Instant};

use anyhow::Result;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};

use fieldcore::{
    DisplayInputs, FieldKernel, SimulationInputs, Slot, SurfaceExtent, SurfaceSize,
    TargetAllocator,
};

use crate::types::{AdapterProfile, RendererConfig};

use super::context::GpuContext;
use super::pipeline::FieldPipelines;
use super::targets::{create_field_sampler, FieldTexture};
use super::uniforms::{DisplayUniforms, SimulationUniforms};

/// wgpu implementation of the field kernel.
///
/// The simulation pass is recorded into an encoder that stays open until the
/// display pass has drawn into the acquired frame, so both passes of a tick
/// go to the queue in a single submission.
pub struct GpuState {
    context: GpuContext,
    pipelines: FieldPipelines,
    sampler: wgpu::Sampler,
    simulation_buffer: wgpu::Buffer,
    simulation_bind_group: wgpu::BindGroup,
    display_buffer: wgpu::Buffer,
    display_bind_group: wgpu::BindGroup,
    encoder: Option<wgpu::CommandEncoder>,
    frame_count: u64,
    frames_per_second: f32,
    frames_since_last_update: u32,
    last_fps_update: Instant,
}

impl GpuState {
    pub fn new<T>(target: &T, window_size: SurfaceSize, config: &RendererConfig) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, window_size, config.gpu_power, config.gpu_latency)?;
        let pipelines = FieldPipelines::new(&context.device, context.surface_format)?;
        let sampler = create_field_sampler(&context.device);

        let (simulation_buffer, simulation_bind_group) = uniform_block(
            &context.device,
            &pipelines.uniform_layout,
            "simulation uniforms",
            std::mem::size_of::<SimulationUniforms>(),
        );
        let (display_buffer, display_bind_group) = uniform_block(
            &context.device,
            &pipelines.uniform_layout,
            "display uniforms",
            std::mem::size_of::<DisplayUniforms>(),
        );

        Ok(Self {
            context,
            pipelines,
            sampler,
            simulation_buffer,
            simulation_bind_group,
            display_buffer,
            display_bind_group,
            encoder: None,
            frame_count: 0,
            frames_per_second: 60.0,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
        })
    }

    pub fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub fn surface_size(&self) -> SurfaceSize {
        self.context.size()
    }

    /// Reconfigures the surface at its current size after it was lost or
    /// went out of date.
    pub fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.context.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("field encoder"),
            })
        })
    }

    fn submit_pending(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.context.queue.submit(Some(encoder.finish()));
        }
    }

    fn record_stats(&mut self, acquire: Duration) {
        let frame_time_budget = Duration::from_secs_f32(1.0 / self.frames_per_second.max(1.0));
        if acquire > frame_time_budget {
            warn!(
                "acquiring frame took {}ms, which is over the frame budget of {}ms (at {} FPS)",
                acquire.as_millis(),
                frame_time_budget.as_millis(),
                self.frames_per_second.round(),
            );
        }

        let now = Instant::now();
        self.frame_count += 1;
        self.frames_since_last_update += 1;
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            self.frames_per_second = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = self.frames_per_second.round(),
                frame_count = self.frame_count,
                "render stats"
            );
        }
    }
}

impl TargetAllocator for GpuState {
    type Target = FieldTexture;

    fn allocate(&mut self, slot: Slot, size: SurfaceSize) -> FieldTexture {
        FieldTexture::new(
            &self.context.device,
            &self.pipelines.field_layout,
            &self.sampler,
            slot,
            size,
        )
    }

    fn max_dimension(&self) -> u32 {
        self.context.device.limits().max_texture_dimension_2d
    }
}

impl FieldKernel for GpuState {
    type Error = wgpu::SurfaceError;

    fn configure_surface(&mut self, extent: &SurfaceExtent) {
        self.context.resize(extent.window);
        debug!(
            width = extent.window.width,
            height = extent.window.height,
            density = extent.density,
            "resized GPU surface"
        );
    }

    fn simulate(
        &mut self,
        previous: &FieldTexture,
        output: &mut FieldTexture,
        inputs: &SimulationInputs,
    ) -> Result<(), wgpu::SurfaceError> {
        let uniforms = SimulationUniforms::from_inputs(inputs);
        self.context
            .queue
            .write_buffer(&self.simulation_buffer, 0, bytemuck::bytes_of(&uniforms));

        let pipeline = self.pipelines.simulation.clone();
        let uniform_group = self.simulation_bind_group.clone();
        let encoder = self.encoder();
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("simulation pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &output.view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &uniform_group, &[]);
        pass.set_bind_group(1, &previous.bind_group, &[]);
        pass.draw(0..3, 0..1);
        Ok(())
    }

    fn display(
        &mut self,
        field: &FieldTexture,
        inputs: &DisplayInputs,
    ) -> Result<(), wgpu::SurfaceError> {
        let acquire_start = Instant::now();
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(err) => {
                // Keep the simulation step even when there is nothing to
                // present it on.
                self.submit_pending();
                return Err(err);
            }
        };
        self.record_stats(acquire_start.elapsed());

        let uniforms = DisplayUniforms::from_inputs(inputs, self.context.encode_srgb);
        self.context
            .queue
            .write_buffer(&self.display_buffer, 0, bytemuck::bytes_of(&uniforms));

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let pipeline = self.pipelines.display.clone();
        let uniform_group = self.display_bind_group.clone();
        let encoder = self.encoder();
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("display pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &uniform_group, &[]);
            pass.set_bind_group(1, &field.bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.submit_pending();
        frame.present();
        Ok(())
    }
}

fn uniform_block(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    label: &str,
    size: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: buffer.as_entire_binding(),
        }],
    });
    (buffer, bind_group)
}
