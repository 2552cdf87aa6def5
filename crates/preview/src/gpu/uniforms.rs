use bytemuck::{Pod, Zeroable};

use crate::runtime::FrameUniforms;

/// std140 mirror of the `PreviewParams` uniform block in the shader header.
/// The vec3 resolution and trailing float time pack into one 16-byte slot.
#[repr(C, align(16))]
#[derive(Clone, Copy)]
pub(crate) struct PreviewUniforms {
    pub resolution: [f32; 3],
    pub time: f32,
}

unsafe impl Zeroable for PreviewUniforms {}
unsafe impl Pod for PreviewUniforms {}

impl PreviewUniforms {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: [width as f32, height as f32, 0.0],
            time: 0.0,
        }
    }
}

impl From<&FrameUniforms> for PreviewUniforms {
    fn from(frame: &FrameUniforms) -> Self {
        Self {
            resolution: frame.resolution,
            time: frame.time,
        }
    }
}
