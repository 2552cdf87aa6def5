//! End-to-end edit cycle exercised against the real compiler, with the GPU
//! replaced by a recording stub: a working shader, then a broken edit, then a
//! fixed edit. Frames must keep flowing throughout and the broken edit must
//! never become the active program.

use std::time::{Duration, Instant};

use preview::{
    try_compile, CompileError, CompileEvent, FrameUniforms, LoopState, PreviewBackend,
    PreviewConfig, PreviewLoop, SurfaceMetrics, ValidatedFragment,
};

const GRADIENT: &str = r#"
precision highp float;
uniform float time;
uniform vec3 resolution;
void main() {
    vec2 uv = gl_FragCoord.xy / resolution.xy;
    gl_FragColor = vec4(uv, 0.5 + 0.5 * sin(time), 1.0);
}
"#;

// Missing semicolon on the first statement.
const BROKEN: &str = r#"
void main() {
    vec2 uv = gl_FragCoord.xy / resolution.xy
    gl_FragColor = vec4(uv, 0.0, 1.0);
}
"#;

const FIXED: &str = r#"
void main() {
    vec2 uv = gl_FragCoord.xy / resolution.xy;
    gl_FragColor = vec4(uv, 0.0, 1.0);
}
"#;

struct StubGpu {
    active: ValidatedFragment,
    frames: u32,
    swaps: u32,
}

impl StubGpu {
    fn new(initial: &str) -> Self {
        Self {
            active: try_compile(initial).expect("initial shader must be valid"),
            frames: 0,
            swaps: 0,
        }
    }
}

impl PreviewBackend for StubGpu {
    type Program = ValidatedFragment;
    type DrawError = std::convert::Infallible;

    fn resolve_surface(&mut self) -> Option<SurfaceMetrics> {
        Some(SurfaceMetrics {
            logical_width: 800.0,
            logical_height: 600.0,
            scale_factor: 1.0,
        })
    }

    fn backing_size(&self) -> (u32, u32) {
        (800, 600)
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn draw(&mut self, _uniforms: &FrameUniforms) -> Result<(), Self::DrawError> {
        self.frames += 1;
        Ok(())
    }

    fn compile(&mut self, source: &str) -> Result<ValidatedFragment, CompileError> {
        try_compile(source)
    }

    fn adopt(&mut self, program: ValidatedFragment) {
        self.active = program;
        self.swaps += 1;
    }

    fn swap_targets(&mut self) {}
}

fn run_frames(
    preview: &mut PreviewLoop,
    backend: &mut StubGpu,
    t0: Instant,
    from_ms: u64,
    to_ms: u64,
) -> Vec<CompileEvent> {
    let mut events = Vec::new();
    let mut at = from_ms;
    while at <= to_ms {
        let report = preview
            .advance_frame(backend, t0 + Duration::from_millis(at))
            .unwrap();
        events.extend(report.compile);
        at += 16;
    }
    events
}

#[test]
fn broken_edit_keeps_last_known_good_until_fixed() {
    let t0 = Instant::now();
    let config = PreviewConfig {
        initial_source: GRADIENT.to_owned(),
        ..PreviewConfig::default()
    };
    let mut backend = StubGpu::new(&config.initial_source);
    let mut preview = PreviewLoop::new(&config, t0);

    // Warm up on the working shader.
    let events = run_frames(&mut preview, &mut backend, t0, 16, 480);
    assert!(events.is_empty());
    let frames_before_edit = backend.frames;
    assert!(frames_before_edit > 0);

    // Broken edit: exactly one failed compile, no swap, frames continue.
    preview.update_source(BROKEN.to_owned(), t0 + Duration::from_millis(500));
    let events = run_frames(&mut preview, &mut backend, t0, 496, 1200);
    assert_eq!(events.len(), 1);
    match &events[0] {
        CompileEvent::Failed { diagnostic } => assert!(!diagnostic.is_empty()),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(backend.swaps, 0);
    assert_eq!(backend.active.source(), GRADIENT);
    assert!(backend.frames > frames_before_edit);

    // Fixed edit: one successful compile, the program swaps.
    preview.update_source(FIXED.to_owned(), t0 + Duration::from_millis(1300));
    let events = run_frames(&mut preview, &mut backend, t0, 1296, 2000);
    assert_eq!(events.len(), 1);
    assert!(events[0].is_success());
    assert_eq!(backend.swaps, 1);
    assert_eq!(backend.active.source(), FIXED);
}

#[test]
fn burst_of_edits_compiles_only_the_final_revision() {
    let t0 = Instant::now();
    let config = PreviewConfig {
        initial_source: GRADIENT.to_owned(),
        ..PreviewConfig::default()
    };
    let mut backend = StubGpu::new(&config.initial_source);
    let mut preview = PreviewLoop::new(&config, t0);

    // Keystrokes every 100ms, ending on a valid revision.
    preview.update_source(BROKEN.to_owned(), t0 + Duration::from_millis(100));
    preview.update_source(BROKEN.to_owned(), t0 + Duration::from_millis(200));
    preview.update_source(FIXED.to_owned(), t0 + Duration::from_millis(300));

    let events = run_frames(&mut preview, &mut backend, t0, 16, 1500);
    assert_eq!(events.len(), 1, "burst must collapse to one compile");
    assert!(events[0].is_success());
    assert_eq!(backend.swaps, 1);
    assert_eq!(backend.active.source(), FIXED);
}

#[test]
fn compile_frame_is_observable_then_returns_to_running() {
    let t0 = Instant::now();
    let mut backend = StubGpu::new(GRADIENT);
    let mut preview = PreviewLoop::new(&PreviewConfig::default(), t0);

    preview.update_source(FIXED.to_owned(), t0);
    let report = preview
        .advance_frame(&mut backend, t0 + Duration::from_millis(600))
        .unwrap();
    assert_eq!(report.state, LoopState::PendingCompile);

    let report = preview
        .advance_frame(&mut backend, t0 + Duration::from_millis(700))
        .unwrap();
    assert_eq!(report.state, LoopState::Running);
}
