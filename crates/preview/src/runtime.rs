use std::time::Instant;

use tracing::{debug, info, warn};

use crate::compile::CompileError;
use crate::debounce::ChangeDebouncer;
use crate::sizer::{self, SizeAction};
use crate::types::{CompileEvent, PreviewConfig, SurfaceMetrics};

/// Animation clock driving the `time` uniform.
///
/// Time accumulates frame deltas rather than sampling wall-clock offsets, so
/// pauses spent idle do not fast-forward the animation and the value is never
/// reset across shader swaps.
#[derive(Debug)]
pub struct FrameClock {
    previous: Instant,
    time: f32,
}

impl FrameClock {
    pub fn new(now: Instant) -> Self {
        Self {
            previous: now,
            time: 0.0,
        }
    }

    /// Advances the clock by the delta since the previous tick and returns
    /// the accumulated animation time in seconds.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = now.saturating_duration_since(self.previous);
        self.previous = now;
        self.time += delta.as_secs_f32();
        self.time
    }

    /// Moves the reference point forward without accumulating, so time spent
    /// with no drawable surface is excluded from the animation.
    pub fn idle(&mut self, now: Instant) {
        self.previous = now;
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

/// Uniform values computed once per frame and handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUniforms {
    /// Accumulated animation time in seconds.
    pub time: f32,
    /// Backing-store width, height, and a zero pad component.
    pub resolution: [f32; 3],
}

impl FrameUniforms {
    fn new() -> Self {
        Self {
            time: 0.0,
            resolution: [0.0; 3],
        }
    }
}

/// Coarse phase of the preview loop, reported once per frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Frames are being produced with the active program.
    Running,
    /// A debounced edit was released and compiled this frame.
    PendingCompile,
    /// No drawable surface; the loop is parked until one returns.
    Idle,
}

/// What happened during one [`PreviewLoop::advance_frame`] call.
#[derive(Debug)]
pub struct FrameReport {
    pub state: LoopState,
    /// Whether the backing store was recreated this frame.
    pub resized: bool,
    /// Outcome of a compile attempted this frame, if any.
    pub compile: Option<CompileEvent>,
}

/// Rendering and compilation surface the loop drives.
///
/// The loop never touches the GPU directly; everything it needs is behind
/// this trait, which keeps the ordering and fallback rules testable without
/// a device.
pub trait PreviewBackend {
    /// Compiled program ready for adoption.
    type Program;
    /// Failure produced by [`draw`](PreviewBackend::draw); the loop
    /// propagates it untouched so the caller can apply surface recovery.
    type DrawError;

    /// Current surface metrics, or `None` when there is nothing to draw
    /// into (zero-area or unmapped surface).
    fn resolve_surface(&mut self) -> Option<SurfaceMetrics>;

    /// Physical size of the current backing store.
    fn backing_size(&self) -> (u32, u32);

    /// Recreates the swapchain and render targets at the given size.
    fn resize(&mut self, width: u32, height: u32);

    /// Renders one frame with the active program into the back target and
    /// presents it.
    fn draw(&mut self, uniforms: &FrameUniforms) -> Result<(), Self::DrawError>;

    /// Builds a candidate program without touching the active one.
    fn compile(&mut self, source: &str) -> Result<Self::Program, CompileError>;

    /// Atomically replaces the active program with a validated candidate.
    fn adopt(&mut self, program: Self::Program);

    /// Exchanges the front and back render targets.
    fn swap_targets(&mut self);
}

/// Orchestrates sizing, drawing, debounced recompilation, and target swaps.
///
/// One call to [`advance_frame`](PreviewLoop::advance_frame) is one frame.
/// Within a frame the order is fixed: resolve the surface, reconcile its
/// size, draw with the active program, then service at most one debounced
/// edit, advance the clock, and swap targets. A failed compile leaves the
/// active program in place, so the last-known-good shader keeps animating
/// under broken source.
pub struct PreviewLoop {
    debouncer: ChangeDebouncer,
    clock: FrameClock,
    uniforms: FrameUniforms,
    state: LoopState,
}

impl PreviewLoop {
    pub fn new(config: &PreviewConfig, now: Instant) -> Self {
        Self {
            debouncer: ChangeDebouncer::new(config.debounce),
            clock: FrameClock::new(now),
            uniforms: FrameUniforms::new(),
            state: LoopState::Running,
        }
    }

    /// Registers edited source; compilation happens on a later frame once
    /// the debounce window closes.
    pub fn update_source(&mut self, source: String, now: Instant) {
        self.debouncer.on_edit(source, now);
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Runs one frame against `backend` at timestamp `now`.
    pub fn advance_frame<B: PreviewBackend>(
        &mut self,
        backend: &mut B,
        now: Instant,
    ) -> Result<FrameReport, B::DrawError> {
        let Some(metrics) = backend.resolve_surface() else {
            if self.state != LoopState::Idle {
                debug!("surface unavailable, pausing preview loop");
            }
            self.state = LoopState::Idle;
            self.clock.idle(now);
            return Ok(FrameReport {
                state: LoopState::Idle,
                resized: false,
                compile: None,
            });
        };

        if self.state == LoopState::Idle {
            debug!("surface restored, resuming preview loop");
            self.state = LoopState::Running;
        }

        let resized = match sizer::reconcile(backend.backing_size(), &metrics) {
            SizeAction::Keep => false,
            SizeAction::Resize { width, height } => {
                debug!(width, height, "recreating surface resources");
                backend.resize(width, height);
                true
            }
        };

        let (width, height) = backend.backing_size();
        self.uniforms.resolution = [width as f32, height as f32, 0.0];

        backend.draw(&self.uniforms)?;

        let compile = self.debouncer.poll(now).map(|source| {
            self.state = LoopState::PendingCompile;
            match backend.compile(&source) {
                Ok(program) => {
                    backend.adopt(program);
                    info!("shader swap applied");
                    CompileEvent::Succeeded
                }
                Err(error) => {
                    let diagnostic = error.to_string();
                    warn!(%diagnostic, "shader rejected, keeping active program");
                    CompileEvent::Failed { diagnostic }
                }
            }
        });

        // Time advances after the frame is produced, so the value drawn this
        // frame is the one accumulated up to the previous tick.
        self.uniforms.time = self.clock.tick(now);
        backend.swap_targets();

        let state = self.state;
        self.state = LoopState::Running;

        Ok(FrameReport {
            state,
            resized,
            compile,
        })
    }
}
