use std::borrow::Cow;

use wgpu::naga::front::glsl::{Frontend, Options};
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::ShaderStage;

/// Error raised when a candidate fragment shader fails to build.
///
/// The `Display` form is the diagnostic string handed to the caller; it is
/// always non-empty. A failed compile never touches the active program.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Validation(String),
}

/// Fragment source that passed the GLSL frontend and the IR validator.
///
/// Only validated wraps ever reach the GPU, so building a [`ProgramHandle`]
/// from one cannot poison the device with a broken module.
///
/// [`ProgramHandle`]: crate::gpu
#[derive(Debug, Clone)]
pub struct ValidatedFragment {
    source: String,
    wrapped: String,
}

impl ValidatedFragment {
    /// The user source exactly as submitted.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The self-contained GLSL 450 text fed to the GPU shader module.
    pub(crate) fn wrapped(&self) -> &str {
        &self.wrapped
    }
}

/// Validates a candidate fragment shader against the fixed vertex stage.
///
/// The candidate is wrapped (see [`wrap_fragment`]) and then parsed and
/// validated entirely on the CPU with naga's GLSL frontend; no GPU context is
/// created or mutated. Success means the wrapped text is safe to turn into a
/// shader module on the existing device.
pub fn try_compile(source: &str) -> Result<ValidatedFragment, CompileError> {
    let wrapped = wrap_fragment(source);

    let mut frontend = Frontend::default();
    let module = frontend
        .parse(&Options::from(ShaderStage::Fragment), &wrapped)
        .map_err(|errors| CompileError::Parse(errors.emit_to_string(&wrapped)))?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::default());
    validator
        .validate(&module)
        .map_err(|error| CompileError::Validation(error.emit_to_string(&wrapped)))?;

    Ok(ValidatedFragment {
        source: source.to_owned(),
        wrapped,
    })
}

/// Produces a self-contained GLSL 450 fragment shader from user code.
///
/// Steps performed:
///
/// 1. Strip `#version` and `precision` directives plus any `uniform`
///    declarations of `time`/`resolution`, so WebGL-style sources compile
///    unchanged against our own definitions.
/// 2. Prepend [`HEADER`], which declares the uniform block and macro aliases
///    for `time`, `resolution`, and `gl_FragColor`.
/// 3. Emit `#line 1` so diagnostics point at the user's own line numbers.
fn wrap_fragment(source: &str) -> String {
    let mut sanitized = String::new();
    let mut skipped_version = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if !skipped_version && trimmed.starts_with("#version") {
            skipped_version = true;
            continue;
        }
        if trimmed.starts_with("precision ") {
            continue;
        }
        let skip_uniform = trimmed.starts_with("uniform ")
            && (trimmed.contains("time") || trimmed.contains("resolution"));
        if skip_uniform {
            continue;
        }
        sanitized.push_str(line);
        sanitized.push('\n');
    }

    format!("{HEADER}\n#line 1\n{sanitized}")
}

/// GLSL prologue injected ahead of every user fragment shader.
///
/// The uniform block layout must match `PreviewUniforms` in `gpu/uniforms.rs`
/// (std140: the vec3 and the trailing float pack into a single 16-byte slot).
/// Shader authors may rely on `time`, `resolution`, and `gl_FragColor` being
/// present in every compiled program.
const HEADER: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 fragview_color;

layout(std140, set = 0, binding = 0) uniform PreviewParams {
    vec3 _resolution;
    float _time;
} ubo;

#define resolution ubo._resolution
#define time ubo._time
#define gl_FragColor fragview_color
";

/// Minimal full-screen triangle vertex shader; the fixed `position` handling
/// every fragment program is compiled against.
pub(crate) const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = pos * 0.5 + vec2(0.5, 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Compiles the static vertex stage on the supplied device.
pub(crate) fn compile_vertex_shader(device: &wgpu::Device) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("fullscreen triangle vertex"),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Borrowed(VERTEX_SHADER_GLSL),
            stage: ShaderStage::Vertex,
            defines: &[],
        },
    })
}
