use thiserror::Error;

use crate::gpu::{
    Filtering, FilteringConfig, ImageFormat, Program, Semantic, ShaderError, Texture, TextureConfig, UniformSlot,
    VertexBuffer,
};
use crate::render::framebuffer::{AttachmentDesc, Framebuffer, FramebufferError, ReadbackError};
use crate::render::registry::{ProgramKind, RegistryError, ShaderRegistry, TargetFormats};
use crate::scene::Rgb;

use super::backend::{Batch, RenderBackend};
use super::picking::{COLOR_ATTACHMENT, ID_ATTACHMENT};
use super::quad::{VERTICES_PER_QUAD, WINDING};
use super::PrimitiveKind;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const ID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Uint;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Target(#[from] FramebufferError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Uniform slots every offscreen program declares, resolved once.
#[derive(Debug, Copy, Clone)]
struct SceneSlots {
    projection: UniformSlot,
    view: UniformSlot,
    model: UniformSlot,
}

impl SceneSlots {
    fn resolve(programs: &ShaderRegistry<Program>, kind: PrimitiveKind) -> Result<Self, BackendError> {
        let program = programs.require(kind.program())?;
        Ok(Self {
            projection: program.uniform("projection")?,
            view: program.uniform("view")?,
            model: program.uniform("model")?,
        })
    }
}

/// wgpu implementation of [`RenderBackend`].
///
/// Draws into an offscreen [`Framebuffer`] with a visible `"color"`
/// attachment and an `"id"` attachment, then composites the color onto the
/// caller's surface view. Every batch is uploaded and submitted on its own
/// so one vertex buffer per kind can be reused within a frame.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    programs: ShaderRegistry<Program>,
    target: Framebuffer,
    buffers: [VertexBuffer; PrimitiveKind::COUNT],
    slots: [SceneSlots; PrimitiveKind::COUNT],
    composite_quad: VertexBuffer,
    atlas: Texture,
}

impl WgpuBackend {
    /// Compiles the bundled programs for a surface of `surface_format` and
    /// allocates a `width × height` offscreen target.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        surface_format: wgpu::TextureFormat,
    ) -> Result<Self, BackendError> {
        let formats = TargetFormats { color: COLOR_FORMAT, id: ID_FORMAT, surface: surface_format };
        let programs = ShaderRegistry::standard(device, formats)?;
        Self::with_registry(device, queue, width, height, programs)
    }

    /// Uses caller-built programs. Offscreen programs must target
    /// [`COLOR_FORMAT`] and [`ID_FORMAT`] and declare `projection`, `view`
    /// and `model` uniforms.
    pub fn with_registry(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        mut programs: ShaderRegistry<Program>,
    ) -> Result<Self, BackendError> {
        programs.check_complete()?;

        let target = Framebuffer::new(
            device,
            queue,
            "scribe offscreen target",
            width,
            height,
            &[
                AttachmentDesc { name: COLOR_ATTACHMENT, format: COLOR_FORMAT },
                AttachmentDesc { name: ID_ATTACHMENT, format: ID_FORMAT },
            ],
        )?;

        let slots = [
            SceneSlots::resolve(&programs, PrimitiveKind::Quad)?,
            SceneSlots::resolve(&programs, PrimitiveKind::Circle)?,
            SceneSlots::resolve(&programs, PrimitiveKind::Text)?,
        ];

        let buffers = PrimitiveKind::ALL.map(|kind| {
            let layout = kind.program().vertex_layout();
            let initial = layout.stride() * VERTICES_PER_QUAD as u64;
            VertexBuffer::new(device, buffer_label(kind), layout, initial)
        });

        let composite_quad = VertexBuffer::with_data(
            device,
            "scribe composite quad",
            ProgramKind::Composite.vertex_layout(),
            &composite_vertices(),
        );

        let atlas = blank_atlas(device, queue);
        programs
            .require_mut(ProgramKind::Composite)?
            .bind_textures(device, &[target.attachment(COLOR_ATTACHMENT)?]);
        programs.require_mut(ProgramKind::Text)?.bind_textures(device, &[&atlas]);

        log::info!("wgpu backend ready: {}x{} offscreen target", target.width(), target.height());

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            programs,
            target,
            buffers,
            slots,
            composite_quad,
            atlas,
        })
    }

    #[inline]
    pub fn target(&self) -> &Framebuffer {
        &self.target
    }

    #[inline]
    pub fn atlas(&self) -> &Texture {
        &self.atlas
    }
}

impl RenderBackend for WgpuBackend {
    type Surface = wgpu::TextureView;

    fn begin_target(&mut self, background: Rgb) {
        self.target.bind();
        let cleared = self
            .target
            .clear_color_float(COLOR_ATTACHMENT, background.with_alpha(1.0))
            .and_then(|()| self.target.clear_color_uint(ID_ATTACHMENT, [0; 4]));
        if let Err(e) = cleared {
            log::error!("offscreen clear skipped: {e}");
        }
        self.target.clear_depth_stencil(1.0, 0);

        // Apply the clears now so an empty scene still presents the background.
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scribe clear encoder"),
        });
        drop(self.target.begin_pass(&mut encoder, "scribe clear pass"));
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn draw_batch(&mut self, batch: &Batch<'_>) {
        let kind = batch.kind;
        let slots = self.slots[kind.index()];
        let Some(program) = self.programs.get_mut(kind.program()) else {
            log::warn!("no program for {kind:?}; batch dropped");
            return;
        };

        program.set_mat4(slots.projection, &batch.uniforms.projection);
        program.set_mat4(slots.view, &batch.uniforms.view);
        program.set_mat4(slots.model, &batch.uniforms.model);
        program.upload(&self.queue);

        let buffer = &mut self.buffers[kind.index()];
        buffer.set_data(&self.device, &self.queue, batch.vertices);

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scribe batch encoder"),
        });
        {
            let mut pass = self.target.begin_pass(&mut encoder, buffer_label(kind));
            if program.bind(&mut pass) {
                buffer.bind(&mut pass, 0);
                pass.draw(0..batch.vertex_count, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn present(&mut self, surface: &wgpu::TextureView) {
        self.target.unbind();

        let Some(program) = self.programs.get(ProgramKind::Composite) else {
            log::warn!("no composite program; frame not presented");
            return;
        };

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("scribe composite encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scribe composite pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: surface,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            if program.bind(&mut pass) {
                self.composite_quad.bind(&mut pass, 0);
                pass.draw(0..self.composite_quad.vertex_count(), 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn upload_glyph_atlas(&mut self, width: u32, height: u32, pixels: &[u8]) {
        let config = TextureConfig {
            filtering: FilteringConfig { min: Filtering::Linear, mag: Filtering::Linear },
            image_format: ImageFormat { internal: wgpu::TextureFormat::R8Unorm },
            extra_usage: wgpu::TextureUsages::empty(),
        };
        self.atlas = Texture::new(&self.device, &self.queue, "scribe glyph atlas", width, height, Some(pixels), config);

        match self.programs.get_mut(ProgramKind::Text) {
            Some(program) => program.bind_textures(&self.device, &[&self.atlas]),
            None => log::warn!("no text program; glyph atlas not bound"),
        }
    }

    fn read_attachment(&self, name: &str, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>, ReadbackError> {
        self.target.reader(name)?.read_pixels(&self.device, &self.queue, x, y, width, height)
    }

    fn target_size(&self) -> (u32, u32) {
        (self.target.width(), self.target.height())
    }
}

fn buffer_label(kind: PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Quad => "scribe quad batch",
        PrimitiveKind::Circle => "scribe circle batch",
        PrimitiveKind::Text => "scribe text batch",
    }
}

/// Full-screen quad in NDC; uv follows the disc mask (v = 1 at the top).
fn composite_vertices() -> Vec<u8> {
    let layout = ProgramKind::Composite.vertex_layout();
    let stride = layout.stride() as usize;
    let mut bytes = vec![0; stride * VERTICES_PER_QUAD];
    for (corner, record) in WINDING.iter().zip(bytes.chunks_exact_mut(stride)) {
        let (x, y) = corner.local();
        layout
            .writer(record)
            .write_f32s(Semantic::Position, &[x * 2.0, y * 2.0])
            .write_f32s(Semantic::TexCoord, &corner.mask());
    }
    bytes
}

/// 1×1 empty atlas so the text program is bindable before a font is set.
fn blank_atlas(device: &wgpu::Device, queue: &wgpu::Queue) -> Texture {
    let config = TextureConfig {
        image_format: ImageFormat { internal: wgpu::TextureFormat::R8Unorm },
        ..TextureConfig::default()
    };
    Texture::new(device, queue, "scribe blank atlas", 1, 1, Some(&[0]), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessGpu;
    use crate::math::{Mat4, Vec2, to_radians};
    use crate::render::batch::{BatchConfig, BatchRenderer, decode_id};
    use crate::scene::{Circle, EntityId, Line};

    const SIZE: u32 = 64;

    fn gpu() -> Option<HeadlessGpu> {
        match HeadlessGpu::blocking() {
            Ok(gpu) => Some(gpu),
            Err(e) => {
                eprintln!("skipping GPU test: {e:#}");
                None
            }
        }
    }

    /// Camera at z = 1 looking down -Z with a 90° field of view: the painting
    /// layer at z = -1 shows world y in [-2, 2], 16 pixels per unit.
    fn frame(renderer: &mut BatchRenderer<WgpuBackend>, gpu: &HeadlessGpu, draw: impl FnOnce(&mut BatchRenderer<WgpuBackend>)) {
        let surface = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test surface"),
            size: wgpu::Extent3d { width: SIZE, height: SIZE, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = surface.create_view(&wgpu::TextureViewDescriptor::default());

        let projection = Mat4::perspective(to_radians(90.0), 1.0, 0.1, 10.0);
        renderer.begin_scene(projection, Mat4::translation(0.0, 0.0, -1.0));
        draw(renderer);
        renderer.end_scene(&view);
    }

    fn renderer(gpu: &HeadlessGpu) -> BatchRenderer<WgpuBackend> {
        let backend = WgpuBackend::new(&gpu.device, &gpu.queue, SIZE, SIZE, COLOR_FORMAT)
            .unwrap_or_else(|e| panic!("backend: {e}"));
        BatchRenderer::new(backend, BatchConfig::default())
    }

    #[test]
    fn composite_quad_covers_ndc() {
        let bytes = composite_vertices();
        let records: Vec<[f32; 4]> = bytes.chunks_exact(16).map(bytemuck::pod_read_unaligned).collect();
        assert_eq!(records[0], [-1.0, 1.0, 0.0, 1.0]);
        assert_eq!(records[4], [1.0, -1.0, 1.0, 0.0]);
    }

    #[test]
    fn circle_is_picked_at_its_center() {
        let Some(gpu) = gpu() else { return };
        let mut r = renderer(&gpu);
        frame(&mut r, &gpu, |r| {
            r.draw_circle(&Circle::new(Vec2::zero(), 0.5).with_id(EntityId(77)));
        });

        let reader = r.id_reader();
        assert_eq!(reader.pick(32, 32).ok(), Some(EntityId(77)));
        assert_eq!(reader.pick(0, 0).ok(), Some(EntityId::NONE));
    }

    #[test]
    fn later_draw_wins_at_equal_depth() {
        let Some(gpu) = gpu() else { return };
        let mut r = renderer(&gpu);
        frame(&mut r, &gpu, |r| {
            r.draw_circle(&Circle::new(Vec2::zero(), 0.5).with_id(EntityId(1)));
            r.draw_circle(&Circle::new(Vec2::zero(), 0.5).with_id(EntityId(2)));
        });

        assert_eq!(r.id_reader().pick(32, 32).ok(), Some(EntityId(2)));
    }

    #[test]
    fn window_rows_are_flipped_into_target_rows() {
        let Some(gpu) = gpu() else { return };
        let mut r = renderer(&gpu);
        // Thickness 0.1 around y = 1.9 covers only window row 1.
        frame(&mut r, &gpu, |r| {
            r.draw_line(&Line::new(Vec2::new(-2.0, 1.9), 4.0, 0.0).with_id(EntityId(0x0102_0304)));
        });

        let reader = r.id_reader();
        assert_eq!(reader.pick(32, 1).ok(), Some(EntityId(0x0102_0304)));
        assert_eq!(reader.pick(32, 0).ok(), Some(EntityId::NONE));

        let top = reader.read_pixel(32, SIZE - 2).map(|b| decode_id(&b)).ok();
        let bottom = reader.read_pixel(32, 1).map(|b| decode_id(&b)).ok();
        assert_eq!(top, Some(EntityId(0x0102_0304)));
        assert_eq!(bottom, Some(EntityId::NONE));
    }

    #[test]
    fn empty_scene_clears_ids() {
        let Some(gpu) = gpu() else { return };
        let mut r = renderer(&gpu);
        frame(&mut r, &gpu, |r| {
            r.draw_circle(&Circle::new(Vec2::zero(), 0.5).with_id(EntityId(9)));
        });
        frame(&mut r, &gpu, |_| {});

        let ids = r.id_reader().read_buffer().unwrap_or_default();
        assert_eq!(ids.len(), (SIZE * SIZE * 4) as usize);
        assert!(ids.iter().all(|&b| b == 0));
        assert_eq!(r.stats().total_batches(), 0);
    }
}
