use anyhow::{Context, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::compile::{self, CompileError};
use crate::runtime::FrameUniforms;

use super::context::GpuContext;
use super::pipeline::{BlitPipeline, PipelineLayouts, ProgramHandle};
use super::targets::RenderTargetPair;
use super::uniforms::PreviewUniforms;

/// Owns the device, the offscreen target pair, and the active program.
///
/// The split between `compile` and `adopt` is what makes shader swaps safe:
/// `compile` validates entirely on the CPU and only then builds GPU objects,
/// so a rejected candidate leaves every live resource untouched. The uniform
/// buffer is created once and survives program swaps and resizes, which is
/// why animation time never restarts.
pub(crate) struct GpuState {
    context: GpuContext,
    layouts: PipelineLayouts,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    targets: RenderTargetPair,
    blit: BlitPipeline,
    program: ProgramHandle,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        initial_source: &str,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let context = GpuContext::new(target, initial_size)?;
        let layouts = PipelineLayouts::new(&context.device);

        let uniforms = PreviewUniforms::new(context.size.width, context.size.height);
        let uniform_buffer =
            context
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("preview uniforms"),
                    contents: bytemuck::bytes_of(&uniforms),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
        let uniform_bind_group = context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform bind group"),
            layout: &layouts.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let targets =
            RenderTargetPair::create(&context.device, context.size.width, context.size.height);
        let blit = BlitPipeline::new(&context.device, &layouts, context.surface_format);

        let fragment = compile::try_compile(initial_source)
            .map_err(|err| anyhow::anyhow!(err))
            .context("initial shader failed to compile")?;
        let program = ProgramHandle::new(&context.device, &layouts, &fragment);

        Ok(Self {
            context,
            layouts,
            uniform_buffer,
            uniform_bind_group,
            targets,
            blit,
            program,
        })
    }

    pub(crate) fn backing_size(&self) -> (u32, u32) {
        self.targets.size()
    }

    /// Builds a candidate program; the active one is untouched on failure.
    pub(crate) fn compile(&mut self, source: &str) -> Result<ProgramHandle, CompileError> {
        let fragment = compile::try_compile(source)?;
        Ok(ProgramHandle::new(&self.context.device, &self.layouts, &fragment))
    }

    pub(crate) fn adopt(&mut self, program: ProgramHandle) {
        self.program = program;
    }

    /// Reconfigures the swapchain and recreates the target pair.
    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        debug!(width, height, "resizing surface and render targets");
        self.context.resize(PhysicalSize::new(width, height));
        self.targets
            .recreate(&self.context.device, width, height);
    }

    /// Re-applies the current surface configuration, used to recover from
    /// lost or outdated swapchains without touching the target pair.
    pub(crate) fn reconfigure_surface(&mut self) {
        let size = self.context.size;
        self.context.resize(size);
    }

    pub(crate) fn swap_targets(&mut self) {
        self.targets.swap();
    }

    /// Renders one frame: the active program into the back target, then a
    /// blit of that target onto the acquired surface texture.
    pub(crate) fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), wgpu::SurfaceError> {
        let gpu_uniforms = PreviewUniforms::from(uniforms);
        self.context.queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&gpu_uniforms),
        );

        let frame = self.context.surface.get_current_texture()?;
        let frame_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("preview frame"),
                });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("shader pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.targets.back().view,
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
            pass.set_pipeline(&self.program.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let blit_bind_group = self.blit.bind_target(
            &self.context.device,
            &self.layouts,
            self.targets.back(),
            &self.targets.sampler,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("blit pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame_view,
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
            pass.set_pipeline(&self.blit.pipeline);
            pass.set_bind_group(0, &blit_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
