/// One offscreen color target plus the view and sampler used to read it back.
pub(crate) struct RenderTarget {
    pub _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    fn create(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

/// Double-buffered offscreen pair sized to the backing store.
///
/// The shader renders into the back target each frame and that same target is
/// blitted to the surface; the swap afterwards promotes it to front, where
/// the just-presented frame stays readable for a feedback pass. Swapping
/// exchanges the two without reallocating, so steady-state frames allocate
/// nothing. Targets have no depth or stencil attachment and a single mip
/// level, and are sampled with nearest filtering and clamp-to-edge wrapping.
pub(crate) struct RenderTargetPair {
    front: RenderTarget,
    back: RenderTarget,
    pub sampler: wgpu::Sampler,
    size: (u32, u32),
}

impl RenderTargetPair {
    pub fn create(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("target sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        Self {
            front: RenderTarget::create(device, width, height, "front target"),
            back: RenderTarget::create(device, width, height, "back target"),
            sampler,
            size: (width.max(1), height.max(1)),
        }
    }

    /// Drops both textures and allocates a fresh pair at the new size.
    pub fn recreate(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.front = RenderTarget::create(device, width, height, "front target");
        self.back = RenderTarget::create(device, width, height, "back target");
        self.size = (width.max(1), height.max(1));
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Target holding the last presented frame (valid once the first swap
    /// has happened).
    pub fn front(&self) -> &RenderTarget {
        &self.front
    }

    /// Target the next frame renders into.
    pub fn back(&self) -> &RenderTarget {
        &self.back
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}
