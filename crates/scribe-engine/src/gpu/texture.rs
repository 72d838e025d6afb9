/// Sampler filter for one direction (minification or magnification).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Filtering {
    #[default]
    Nearest,
    Linear,
}

impl From<Filtering> for wgpu::FilterMode {
    fn from(f: Filtering) -> Self {
        match f {
            Filtering::Nearest => wgpu::FilterMode::Nearest,
            Filtering::Linear => wgpu::FilterMode::Linear,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct FilteringConfig {
    pub min: Filtering,
    pub mag: Filtering,
}

/// Storage format of the texture.
///
/// A wgpu format fixes internal layout, channel order and component type at
/// once, so a single field replaces the `{internal, format, type}` triple.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ImageFormat {
    pub internal: wgpu::TextureFormat,
}

impl Default for ImageFormat {
    fn default() -> Self {
        Self { internal: wgpu::TextureFormat::Rgba8Unorm }
    }
}

/// Texture creation parameters.
///
/// Defaults: nearest filtering both ways, `Rgba8Unorm`, sampled + writable.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TextureConfig {
    pub filtering: FilteringConfig,
    pub image_format: ImageFormat,
    /// Usages on top of `TEXTURE_BINDING | COPY_DST`.
    pub extra_usage: wgpu::TextureUsages,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            filtering: FilteringConfig::default(),
            image_format: ImageFormat::default(),
            extra_usage: wgpu::TextureUsages::empty(),
        }
    }
}

/// 2D texture with its default view and sampler.
pub struct Texture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl Texture {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        data: Option<&[u8]>,
        config: TextureConfig,
    ) -> Self {
        let format = config.image_format.internal;
        let width = width.max(1);
        let height = height.max(1);

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | config.extra_usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: config.filtering.mag.into(),
            min_filter: config.filtering.min.into(),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let tex = Self { texture, view, sampler, width, height, format };
        if let Some(data) = data {
            tex.write_region(queue, 0, 0, width, height, data);
        }
        tex
    }

    /// Replaces the `width × height` region starting at `(x, y)`.
    ///
    /// `data` is tightly packed rows of the texture's format.
    pub fn write_region(&self, queue: &wgpu::Queue, x: u32, y: u32, width: u32, height: u32, data: &[u8]) {
        let bpp = self.bytes_per_pixel();
        let expected = (width * height * bpp) as usize;
        if data.len() < expected {
            log::warn!(
                "texture write of {width}x{height} needs {expected} bytes, got {}; skipped",
                data.len()
            );
            return;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            &data[..expected],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * bpp),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
    }

    #[inline]
    pub fn raw(&self) -> &wgpu::Texture {
        &self.texture
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        self.format.block_copy_size(None).unwrap_or(4)
    }
}
