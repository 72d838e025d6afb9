//! Offscreen render target with named color attachments and depth/stencil.
//!
//! Storage rows are bottom-up: row 0 is the bottom of the rendered image.
//! The offscreen vertex shaders flip clip-space y to keep that convention,
//! and the composite pass flips it back when presenting.

use thiserror::Error;

use crate::gpu::{Texture, TextureConfig};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

#[derive(Debug, Error)]
pub enum FramebufferError {
    #[error("{label}: a framebuffer needs at least one color attachment")]
    NoColorAttachment { label: String },
    #[error("{label}: attachment `{name}` declared twice")]
    DuplicateAttachment { label: String, name: String },
    #[error("{label}: no attachment named `{name}`")]
    UnknownAttachment { label: String, name: String },
    #[error("{label}: attachment `{name}` is {format:?}, which cannot take this clear value")]
    ClearFormatMismatch { label: String, name: String, format: wgpu::TextureFormat },
}

#[derive(Debug, Error)]
pub enum ReadbackError {
    #[error("region {x},{y} {width}x{height} lies outside the {target_width}x{target_height} target")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32, target_width: u32, target_height: u32 },
    #[error("device poll failed: {0}")]
    Poll(String),
    #[error("readback buffer mapping failed: {0}")]
    Map(#[from] wgpu::BufferAsyncError),
    #[error("readback callback dropped before completion")]
    Disconnected,
    #[error(transparent)]
    Target(#[from] FramebufferError),
}

/// Declares one color attachment.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttachmentDesc {
    pub name: &'static str,
    pub format: wgpu::TextureFormat,
}

struct ColorAttachment {
    name: &'static str,
    texture: Texture,
    pending_clear: Option<wgpu::Color>,
}

/// Offscreen target: N named color attachments plus a depth/stencil buffer.
///
/// Clears are recorded and applied as load ops by the next [`begin_pass`].
///
/// [`begin_pass`]: Framebuffer::begin_pass
pub struct Framebuffer {
    label: String,
    width: u32,
    height: u32,
    colors: Vec<ColorAttachment>,
    depth_view: wgpu::TextureView,
    pending_depth: Option<(f32, u32)>,
    bound: bool,
}

impl Framebuffer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        attachments: &[AttachmentDesc],
    ) -> Result<Self, FramebufferError> {
        validate_attachments(label, attachments)?;

        let width = width.max(1);
        let height = height.max(1);

        let mut colors = Vec::with_capacity(attachments.len());
        for desc in attachments {
            let mut config = TextureConfig::default();
            config.image_format.internal = desc.format;
            config.extra_usage = wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC;

            let texture = Texture::new(device, queue, &format!("{label} {}", desc.name), width, height, None, config);
            colors.push(ColorAttachment { name: desc.name, texture, pending_clear: None });
        }

        let depth = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(&format!("{label} depth")),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("{label}: framebuffer {width}x{height} with {} color attachments", colors.len());

        Ok(Self {
            label: label.to_owned(),
            width,
            height,
            colors,
            depth_view,
            pending_depth: None,
            bound: false,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color attachment formats in declaration order (pipeline targets).
    pub fn formats(&self) -> Vec<wgpu::TextureFormat> {
        self.colors.iter().map(|c| c.texture.format()).collect()
    }

    pub fn attachment(&self, name: &str) -> Result<&Texture, FramebufferError> {
        self.index_of(name).map(|i| &self.colors[i].texture)
    }

    /// Marks the target as the destination of subsequent passes.
    pub fn bind(&mut self) {
        if self.bound {
            log::warn!("{}: bound twice without unbind", self.label);
        }
        self.bound = true;
    }

    pub fn unbind(&mut self) {
        self.bound = false;
    }

    #[inline]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Schedules a clear of a normalized/float attachment.
    pub fn clear_color_float(&mut self, name: &str, rgba: [f32; 4]) -> Result<(), FramebufferError> {
        let i = self.index_of(name)?;
        if is_integer_format(self.colors[i].texture.format()) {
            return Err(self.mismatch(i));
        }
        let [r, g, b, a] = rgba.map(f64::from);
        self.colors[i].pending_clear = Some(wgpu::Color { r, g, b, a });
        Ok(())
    }

    /// Schedules a clear of an unsigned-integer attachment.
    pub fn clear_color_uint(&mut self, name: &str, rgba: [u32; 4]) -> Result<(), FramebufferError> {
        let i = self.index_of(name)?;
        if !is_integer_format(self.colors[i].texture.format()) {
            return Err(self.mismatch(i));
        }
        let [r, g, b, a] = rgba.map(f64::from);
        self.colors[i].pending_clear = Some(wgpu::Color { r, g, b, a });
        Ok(())
    }

    pub fn clear_depth_stencil(&mut self, depth: f32, stencil: u32) {
        self.pending_depth = Some((depth, stencil));
    }

    /// Opens a render pass over every attachment.
    ///
    /// Pending clears become `LoadOp::Clear` and are consumed; everything
    /// else loads the previous contents.
    pub fn begin_pass<'e>(&mut self, encoder: &'e mut wgpu::CommandEncoder, label: &str) -> wgpu::RenderPass<'e> {
        if !self.bound {
            log::warn!("{}: pass opened on an unbound target", self.label);
        }

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment<'_>>> = self
            .colors
            .iter_mut()
            .map(|c| {
                let load = match c.pending_clear.take() {
                    Some(color) => wgpu::LoadOp::Clear(color),
                    None => wgpu::LoadOp::Load,
                };
                Some(wgpu::RenderPassColorAttachment {
                    view: c.texture.view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
                })
            })
            .collect();

        let (depth_load, stencil_load) = match self.pending_depth.take() {
            Some((d, s)) => (wgpu::LoadOp::Clear(d), wgpu::LoadOp::Clear(s)),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &color_attachments,
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations { load: depth_load, store: wgpu::StoreOp::Store }),
                stencil_ops: Some(wgpu::Operations { load: stencil_load, store: wgpu::StoreOp::Store }),
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    /// Readback accessor for the named attachment.
    pub fn reader(&self, name: &str) -> Result<AttachmentReader<'_>, FramebufferError> {
        let texture = self.attachment(name)?;
        Ok(AttachmentReader { texture })
    }

    fn index_of(&self, name: &str) -> Result<usize, FramebufferError> {
        self.colors.iter().position(|c| c.name == name).ok_or_else(|| FramebufferError::UnknownAttachment {
            label: self.label.clone(),
            name: name.to_owned(),
        })
    }

    fn mismatch(&self, i: usize) -> FramebufferError {
        FramebufferError::ClearFormatMismatch {
            label: self.label.clone(),
            name: self.colors[i].name.to_owned(),
            format: self.colors[i].texture.format(),
        }
    }
}

fn validate_attachments(label: &str, attachments: &[AttachmentDesc]) -> Result<(), FramebufferError> {
    if attachments.is_empty() {
        log::error!("{label}: framebuffer declared without color attachments");
        return Err(FramebufferError::NoColorAttachment { label: label.to_owned() });
    }
    for (i, desc) in attachments.iter().enumerate() {
        if attachments[..i].iter().any(|d| d.name == desc.name) {
            return Err(FramebufferError::DuplicateAttachment {
                label: label.to_owned(),
                name: desc.name.to_owned(),
            });
        }
    }
    Ok(())
}

fn is_integer_format(format: wgpu::TextureFormat) -> bool {
    matches!(
        format.sample_type(None, None),
        Some(wgpu::TextureSampleType::Uint | wgpu::TextureSampleType::Sint)
    )
}

/// Synchronous readback of one attachment, in storage (bottom-up) rows.
pub struct AttachmentReader<'a> {
    texture: &'a Texture,
}

impl AttachmentReader<'_> {
    #[inline]
    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    /// Whole attachment, tightly packed rows.
    pub fn read_buffer(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Vec<u8>, ReadbackError> {
        self.read_pixels(device, queue, 0, 0, self.width(), self.height())
    }

    /// Raw bytes of the texel at `(x, y)`.
    pub fn read_pixel(&self, device: &wgpu::Device, queue: &wgpu::Queue, x: u32, y: u32) -> Result<Vec<u8>, ReadbackError> {
        self.read_pixels(device, queue, x, y, 1, 1)
    }

    /// Copies a region out of the attachment and blocks until it is mapped.
    pub fn read_pixels(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, ReadbackError> {
        let in_bounds = width > 0
            && height > 0
            && x.checked_add(width).is_some_and(|r| r <= self.width())
            && y.checked_add(height).is_some_and(|b| b <= self.height());
        if !in_bounds {
            return Err(ReadbackError::OutOfBounds {
                x,
                y,
                width,
                height,
                target_width: self.width(),
                target_height: self.height(),
            });
        }

        let bpp = self.texture.bytes_per_pixel();
        let unpadded_row = width * bpp;
        let bytes_per_row = unpadded_row.next_multiple_of(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);

        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("attachment readback"),
            size: u64::from(bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("attachment readback"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: self.texture.raw(),
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });

        if let Err(e) = device.poll(wgpu::PollType::wait_indefinitely()) {
            return Err(ReadbackError::Poll(format!("{e:?}")));
        }
        rx.recv().map_err(|_| ReadbackError::Disconnected)??;

        let mut out = Vec::with_capacity((unpadded_row * height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in 0..height {
                let start = (row * bytes_per_row) as usize;
                out.extend_from_slice(&data[start..start + unpadded_row as usize]);
            }
        }
        readback.unmap();

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_list_must_be_non_empty_and_unique() {
        let err = validate_attachments("fb", &[]).err();
        assert!(matches!(err, Some(FramebufferError::NoColorAttachment { .. })));

        let color = AttachmentDesc { name: "color", format: wgpu::TextureFormat::Rgba8Unorm };
        let err = validate_attachments("fb", &[color, color]).err();
        assert!(matches!(err, Some(FramebufferError::DuplicateAttachment { ref name, .. }) if name == "color"));

        let id = AttachmentDesc { name: "id", format: wgpu::TextureFormat::Rgba8Uint };
        assert!(validate_attachments("fb", &[color, id]).is_ok());
    }

    #[test]
    fn integer_formats_take_uint_clears_only() {
        assert!(is_integer_format(wgpu::TextureFormat::Rgba8Uint));
        assert!(is_integer_format(wgpu::TextureFormat::R32Uint));
        assert!(!is_integer_format(wgpu::TextureFormat::Rgba8Unorm));
        assert!(!is_integer_format(wgpu::TextureFormat::Bgra8UnormSrgb));
    }
}
