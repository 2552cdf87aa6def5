use std::time::Duration;

/// Quiet interval applied to bursty source edits before a recompile fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Immutable configuration passed to the preview runtime at start-up.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Fragment shader source the preview starts with; must compile, the
    /// runtime refuses to spawn with a broken initial shader.
    pub initial_source: String,
    /// Quiet interval before a pending edit triggers a recompile.
    pub debounce: Duration,
    /// Title of the preview window.
    pub window_title: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            surface_size: (800, 600),
            initial_source: String::new(),
            debounce: DEFAULT_DEBOUNCE,
            window_title: "Fragment Preview".to_string(),
        }
    }
}

/// Snapshot of the display surface as reported by its handle.
///
/// `logical_*` is the size before device-pixel-ratio scaling (the CSS-like
/// size); the backing store is compared against `logical * scale_factor` to
/// detect drift. A surface whose handle does not currently resolve yields no
/// metrics at all and the loop idles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    pub logical_width: f64,
    pub logical_height: f64,
    pub scale_factor: f64,
}

/// Outcome of one completed compile attempt, reported exactly once per
/// attempt (never for the steady-state draw).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileEvent {
    /// The candidate program was adopted; the swap preserved the running
    /// uniform values.
    Succeeded,
    /// The candidate was rejected; the previously active program keeps
    /// rendering untouched.
    Failed {
        /// Non-empty compiler diagnostic, surfaced as a plain string.
        diagnostic: String,
    },
}

impl CompileEvent {
    pub fn is_success(&self) -> bool {
        matches!(self, CompileEvent::Succeeded)
    }
}
