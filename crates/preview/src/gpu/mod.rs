mod context;
mod pipeline;
mod state;
mod targets;
mod uniforms;

pub(crate) use pipeline::ProgramHandle;
pub(crate) use state::GpuState;
