use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use tracing::{error, warn};
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder};

use crate::compile::CompileError;
use crate::gpu::GpuState;
use crate::runtime::{FrameUniforms, PreviewBackend, PreviewLoop};
use crate::types::{CompileEvent, PreviewConfig, SurfaceMetrics};

/// Backend binding the preview loop to a winit window and its GPU state.
struct WindowBackend {
    window: Arc<Window>,
    gpu: GpuState,
}

impl WindowBackend {
    fn new(window: Arc<Window>, config: &PreviewConfig) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.as_ref(), size, &config.initial_source)?;
        Ok(Self { window, gpu })
    }

    /// Recovery path for lost or outdated swapchains.
    fn reconfigure_surface(&mut self) {
        self.gpu.reconfigure_surface();
    }
}

impl PreviewBackend for WindowBackend {
    type Program = crate::gpu::ProgramHandle;
    type DrawError = wgpu::SurfaceError;

    fn resolve_surface(&mut self) -> Option<SurfaceMetrics> {
        let physical = self.window.inner_size();
        if physical.width == 0 || physical.height == 0 {
            return None;
        }
        let scale_factor = self.window.scale_factor();
        let logical: LogicalSize<f64> = physical.to_logical(scale_factor);
        Some(SurfaceMetrics {
            logical_width: logical.width,
            logical_height: logical.height,
            scale_factor,
        })
    }

    fn backing_size(&self) -> (u32, u32) {
        self.gpu.backing_size()
    }

    fn resize(&mut self, width: u32, height: u32) {
        // The sizer hands back logical dimensions; the swapchain wants the
        // physical backing store.
        let physical =
            LogicalSize::new(f64::from(width), f64::from(height)).to_physical::<u32>(self.window.scale_factor());
        self.gpu
            .resize(physical.width.max(1), physical.height.max(1));
    }

    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), wgpu::SurfaceError> {
        self.gpu.draw(uniforms)
    }

    fn compile(&mut self, source: &str) -> Result<Self::Program, CompileError> {
        self.gpu.compile(source)
    }

    fn adopt(&mut self, program: Self::Program) {
        self.gpu.adopt(program);
    }

    fn swap_targets(&mut self) {
        self.gpu.swap_targets();
    }
}

#[derive(Debug, Clone)]
enum PreviewCommand {
    UpdateSource(String),
    Shutdown,
}

/// Handle to a preview window running on its own thread.
///
/// Edits are forwarded through the event loop proxy; compile outcomes stream
/// back over a channel so the caller can surface diagnostics without touching
/// the render thread.
pub struct PreviewRuntime {
    proxy: EventLoopProxy<PreviewCommand>,
    events: Receiver<CompileEvent>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl PreviewRuntime {
    pub fn spawn(config: PreviewConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let (event_tx, event_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("fragview-preview".into())
            .spawn(move || run_preview_thread(config, ready_tx, event_tx))
            .map_err(|err| anyhow!("failed to spawn preview thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("preview thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            events: event_rx,
            join_handle: Some(handle),
        })
    }

    /// Submits edited shader source; it compiles after the debounce window.
    pub fn update_source(&self, source: String) -> Result<()> {
        self.proxy
            .send_event(PreviewCommand::UpdateSource(source))
            .map_err(|err| anyhow!(err))
    }

    /// Stream of compile outcomes, one per attempted swap.
    pub fn compile_events(&self) -> &Receiver<CompileEvent> {
        &self.events
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(PreviewCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("preview thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for PreviewRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(PreviewCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_preview_thread(
    config: PreviewConfig,
    ready_tx: Sender<Result<EventLoopProxy<PreviewCommand>, anyhow::Error>>,
    event_tx: Sender<CompileEvent>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<PreviewCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }
    let event_loop = builder
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.window_title.clone())
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let mut backend = match WindowBackend::new(window.clone(), &config) {
        Ok(backend) => backend,
        Err(err) => {
            let wrapped = anyhow!("failed to initialise preview renderer: {err}");
            let message = wrapped.to_string();
            let _ = ready_tx.send(Err(anyhow!(message)));
            return Err(wrapped);
        }
    };

    let mut preview = PreviewLoop::new(&config, Instant::now());
    window.request_redraw();

    let _ = ready_tx.send(Ok(proxy.clone()));

    let mut result = Ok(());
    let run_result = event_loop.run(move |event, elwt| {
        match event {
            Event::UserEvent(command) => match command {
                PreviewCommand::UpdateSource(source) => {
                    preview.update_source(source, Instant::now());
                }
                PreviewCommand::Shutdown => {
                    elwt.exit();
                }
            },
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    // The loop reconciles the backing store on the next frame.
                    window.request_redraw();
                }
                WindowEvent::RedrawRequested => {
                    match preview.advance_frame(&mut backend, Instant::now()) {
                        Ok(report) => {
                            if let Some(outcome) = report.compile {
                                let _ = event_tx.send(outcome);
                            }
                        }
                        Err(wgpu::SurfaceError::Lost) | Err(wgpu::SurfaceError::Outdated) => {
                            backend.reconfigure_surface();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            error!("surface out of memory; exiting preview");
                            elwt.exit();
                        }
                        Err(wgpu::SurfaceError::Timeout) => {
                            warn!("surface timeout; retrying next frame");
                        }
                        Err(other) => {
                            warn!("surface error: {other:?}; retrying next frame");
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
                elwt.set_control_flow(ControlFlow::Wait);
            }
            _ => {}
        }
    });

    if let Err(err) = run_result {
        result = Err(anyhow!("preview event loop error: {err}"));
    }

    result
}
