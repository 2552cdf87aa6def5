//! Live-preview engine for fragment-shader source.
//!
//! The crate renders a full-screen quad with a user-supplied fragment shader,
//! watches for source updates, recompiles them without interrupting the
//! running animation, and keeps the last-known-good program on compile
//! failure. The overall flow is:
//!
//! ```text
//!   editor / file watcher
//!          │ update_source(text)
//!          ▼
//!   ChangeDebouncer ──▶ PreviewLoop ──▶ try_compile (validate)
//!          ▲                │                  │ success
//!          │                │                  ▼
//!   winit event loop ◀── draw frame ◀── swap ProgramHandle
//! ```
//!
//! [`PreviewLoop`] is the per-frame state machine; it is generic over
//! [`PreviewBackend`] so its ordering guarantees (one compile per quiet
//! period, failed compiles never touching the active program, monotonic
//! shader time) can be tested without a GPU. The wgpu implementation lives in
//! the `gpu` module and is driven by [`PreviewRuntime`], which owns the winit
//! window thread. Compile outcomes are reported once per attempt over a
//! channel of [`CompileEvent`]s.

pub mod compile;
pub mod debounce;
mod gpu;
pub mod runtime;
pub mod sizer;
pub mod types;
mod window;

pub use compile::{try_compile, CompileError, ValidatedFragment};
pub use debounce::ChangeDebouncer;
pub use runtime::{FrameClock, FrameReport, FrameUniforms, LoopState, PreviewBackend, PreviewLoop};
pub use sizer::{reconcile, SizeAction};
pub use types::{CompileEvent, PreviewConfig, SurfaceMetrics};
pub use window::PreviewRuntime;
