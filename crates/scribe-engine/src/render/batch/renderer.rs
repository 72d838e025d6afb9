use crate::math::{Mat4, Vec3, to_radians};
use crate::scene::{Circle, Drawable, EntityId, Line, Rgb, Text};
use crate::text::{BLANK_UV, FontAtlas, Glyph, GlyphMetrics};

use super::backend::{Batch, RenderBackend, SceneUniforms};
use super::picking::IdReader;
use super::quad::{MASK, QuadTransform, WINDING};
use super::staging::StagingBuffer;
use super::stats::FrameStats;
use super::PrimitiveKind;
use crate::gpu::Semantic;

/// Capacities and drawing constants of a [`BatchRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Line quads per batch.
    pub quad_capacity: usize,
    pub circle_capacity: usize,
    /// Glyph quads per batch.
    pub text_capacity: usize,
    /// World-space width of every line quad.
    pub line_thickness: f32,
    /// Depth plane every primitive is drawn on.
    pub painting_layer: f32,
    pub background: Rgb,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            quad_capacity: 10_000,
            circle_capacity: 100,
            text_capacity: 10_000,
            line_thickness: 0.1,
            painting_layer: -1.0,
            background: Rgb::BLACK,
        }
    }
}

impl BatchConfig {
    pub fn capacity(&self, kind: PrimitiveKind) -> usize {
        match kind {
            PrimitiveKind::Quad => self.quad_capacity,
            PrimitiveKind::Circle => self.circle_capacity,
            PrimitiveKind::Text => self.text_capacity,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SceneState {
    Idle,
    Open,
}

/// One laid out glyph: where the unit quad goes and which atlas texels it
/// samples, per corner in [`Corner::index`](super::quad::Corner::index) order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphQuad {
    pub transform: QuadTransform,
    pub uv: [[f32; 2]; 4],
}

/// Immediate-mode renderer that packs primitives into per-kind staging
/// buffers and hands full or finished buffers to its backend.
///
/// A frame is `begin_scene`, any number of draws, then `end_scene`. Each kind
/// flushes on its own when its staging buffer fills up.
pub struct BatchRenderer<B: RenderBackend> {
    backend: B,
    config: BatchConfig,
    staging: [StagingBuffer; PrimitiveKind::COUNT],
    state: SceneState,
    uniforms: Option<SceneUniforms>,
    stats: FrameStats,
    glyphs: Option<Box<dyn GlyphMetrics>>,
}

impl<B: RenderBackend> BatchRenderer<B> {
    pub fn new(backend: B, config: BatchConfig) -> Self {
        let staging = PrimitiveKind::ALL
            .map(|kind| StagingBuffer::new(kind.program().vertex_layout(), config.capacity(kind)));

        log::debug!(
            "batch renderer: {} quads, {} circles, {} glyphs per batch",
            staging[0].capacity(),
            staging[1].capacity(),
            staging[2].capacity()
        );

        Self {
            backend,
            config,
            staging,
            state: SceneState::Idle,
            uniforms: None,
            stats: FrameStats::default(),
            glyphs: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[inline]
    pub fn is_scene_open(&self) -> bool {
        self.state == SceneState::Open
    }

    /// Primitives of `kind` waiting for the next flush.
    #[inline]
    pub fn staged(&self, kind: PrimitiveKind) -> usize {
        self.staging[kind.index()].count()
    }

    /// Counters of the current (or last finished) frame.
    #[inline]
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Installs glyph metrics without touching the backend's atlas.
    pub fn set_glyph_metrics(&mut self, metrics: Box<dyn GlyphMetrics>) {
        self.glyphs = Some(metrics);
    }

    /// Uploads the atlas texture and uses its metrics for text layout.
    pub fn set_font(&mut self, atlas: FontAtlas) {
        let (w, h) = atlas.atlas_size();
        self.backend.upload_glyph_atlas(w, h, atlas.pixels());
        log::info!("font atlas installed: {} glyphs, {w}x{h}", atlas.len());
        self.glyphs = Some(Box::new(atlas));
    }

    pub fn begin_scene(&mut self, projection: Mat4, view: Mat4) {
        if self.state == SceneState::Open {
            log::warn!("begin_scene called while a scene is open; previous scene is discarded");
        }
        if self.staging.iter().any(|s| !s.is_empty()) {
            log::warn!("previous scene left unflushed primitives; dropping them");
        }
        for staging in &mut self.staging {
            staging.reset();
        }

        self.stats.reset();
        self.uniforms = Some(SceneUniforms { projection, view, model: Mat4::identity() });
        self.state = SceneState::Open;
        self.backend.begin_target(self.config.background);
    }

    /// Oriented quad centered on the segment's midpoint.
    pub fn draw_line(&mut self, line: &Line) {
        let center = line.center();
        let transform = QuadTransform {
            translate: Some(Vec3::new(center.x, center.y, 0.0)),
            rotate: Some(to_radians(line.rotate)),
            scale: Some(Vec3::new(line.length, self.config.line_thickness, 1.0)),
        };
        self.emit_quad(PrimitiveKind::Quad, transform, line.color, None, line.id);
    }

    pub fn draw_circle(&mut self, circle: &Circle) {
        let d = 2.0 * circle.radius;
        let transform = QuadTransform {
            translate: Some(Vec3::new(circle.position.x, circle.position.y, 0.0)),
            rotate: None,
            scale: Some(Vec3::new(d, d, 1.0)),
        };
        self.emit_quad(PrimitiveKind::Circle, transform, circle.color, Some(&MASK), circle.id);
    }

    /// One quad per non-newline character, laid out with the installed
    /// glyph metrics (unit metrics when none are installed).
    pub fn draw_text(&mut self, text: &Text) {
        if !self.accepts_draws() {
            return;
        }
        for glyph in layout_text(text, self.glyphs.as_deref()) {
            self.emit_quad(PrimitiveKind::Text, glyph.transform, text.color, Some(&glyph.uv), text.id);
        }
    }

    pub fn draw(&mut self, drawable: &Drawable) {
        match drawable {
            Drawable::Line(line) => self.draw_line(line),
            Drawable::Circle(circle) => self.draw_circle(circle),
            Drawable::Text(text) => self.draw_text(text),
        }
    }

    /// Stages one unit quad of `kind`, flushing that kind first if it is full.
    ///
    /// `extras` supplies the kind's per-corner field (mask or texture
    /// coordinates); it is ignored for kinds without one and zeroed when
    /// missing.
    pub fn emit_quad(
        &mut self,
        kind: PrimitiveKind,
        transform: QuadTransform,
        color: Rgb,
        extras: Option<&[[f32; 2]; 4]>,
        id: EntityId,
    ) {
        if !self.accepts_draws() {
            return;
        }

        if self.staging[kind.index()].is_full() {
            self.flush_kind(kind);
        }

        let corners = transform.corners(self.config.painting_layer);
        let color = color.to_array();
        let extra = kind.extra();
        let id = id.get();

        let pushed = self.staging[kind.index()].push_quad(|i, w| {
            let corner = WINDING[i].index();
            w.write_f32s(Semantic::Position, &corners[corner].xyz())
                .write_f32s(Semantic::Color, &color)
                .write_u32(Semantic::Id, id);
            if let Some(semantic) = extra {
                let value = extras.map_or([0.0; 2], |e| e[corner]);
                w.write_f32s(semantic, &value);
            }
        });
        debug_assert!(pushed, "staging buffer was flushed before the push");
    }

    /// Flushes every kind, in [`PrimitiveKind::ALL`] order.
    pub fn flush(&mut self) {
        for kind in PrimitiveKind::ALL {
            self.flush_kind(kind);
        }
    }

    /// Flushes all kinds and composites the offscreen color onto `surface`.
    pub fn end_scene(&mut self, surface: &B::Surface) {
        if self.state != SceneState::Open {
            log::warn!("end_scene called without begin_scene");
        }
        self.flush();
        self.backend.present(surface);
        self.uniforms = None;
        self.state = SceneState::Idle;
    }

    /// Reader over the id attachment of the last drawn frame.
    pub fn id_reader(&self) -> IdReader<'_, B> {
        IdReader::new(&self.backend)
    }

    fn flush_kind(&mut self, kind: PrimitiveKind) {
        let staging = &mut self.staging[kind.index()];
        if staging.is_empty() {
            return;
        }

        let Some(uniforms) = self.uniforms.as_ref() else {
            log::warn!("dropping {} staged {:?} primitives outside a scene", staging.count(), kind);
            staging.reset();
            return;
        };

        self.backend.draw_batch(&Batch {
            kind,
            vertices: staging.bytes(),
            vertex_count: staging.vertex_count(),
            uniforms,
        });
        self.stats.record(kind, staging.count());
        staging.reset();
    }

    fn accepts_draws(&self) -> bool {
        if self.state == SceneState::Open {
            return true;
        }
        log::warn!("draw call outside begin_scene/end_scene ignored");
        false
    }
}

/// Lays `text` out glyph by glyph, starting at its position.
///
/// Coordinates are world units: the cursor advances along +X and a newline
/// moves it down (-Y) by one scaled line height.
pub fn layout_text(text: &Text, metrics: Option<&dyn GlyphMetrics>) -> Vec<GlyphQuad> {
    let (scale, line_height, (atlas_w, atlas_h)) = match metrics {
        Some(m) => (m.scale(text.size), m.line_height(), m.atlas_size()),
        None => (1.0, 1.0, (1, 1)),
    };
    let atlas_w = atlas_w.max(1) as f32;
    let atlas_h = atlas_h.max(1) as f32;

    let mut quads = Vec::with_capacity(text.content.len());
    let mut x = text.position.x;
    let mut y = text.position.y;
    // Only the very first glyph sits flush with the start; later lines keep
    // their bearing.
    let mut first = true;

    for ch in text.content.chars() {
        if ch == '\n' {
            x = text.position.x;
            y -= line_height * scale;
            continue;
        }

        let glyph = metrics.and_then(|m| m.glyph(ch)).unwrap_or(Glyph::FALLBACK);
        let lsb = if first { 0.0 } else { glyph.lsb };
        first = false;

        let w = glyph.width * scale;
        let h = glyph.height * scale;
        let x0 = x + lsb * scale;
        let y0 = y + glyph.bearing_y * scale;

        let (u0, v0, u1, v1) = if ch == ' ' {
            BLANK_UV
        } else {
            let b = glyph.atlas;
            (b.left / atlas_w, b.top / atlas_h, b.right / atlas_w, b.bottom / atlas_h)
        };

        quads.push(GlyphQuad {
            transform: QuadTransform {
                translate: Some(Vec3::new(x0 + w / 2.0, y0 + h / 2.0, 0.0)),
                rotate: None,
                scale: Some(Vec3::new(w, h, 1.0)),
            },
            uv: [[u0, v0], [u1, v0], [u0, v1], [u1, v1]],
        });

        x += (lsb + glyph.width + glyph.rsb) * scale;
    }

    quads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::render::framebuffer::ReadbackError;
    use crate::text::AtlasBounds;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Recording {
        targets: usize,
        presents: usize,
        batches: Vec<(PrimitiveKind, u32, Vec<u8>)>,
        atlas: Option<(u32, u32, usize)>,
        size: (u32, u32),
        ids: Vec<u8>,
    }

    impl Recording {
        fn with_target(width: u32, height: u32) -> Self {
            Self { size: (width, height), ids: vec![0; (width * height * 4) as usize], ..Self::default() }
        }
    }

    impl RenderBackend for Recording {
        type Surface = ();

        fn begin_target(&mut self, _background: Rgb) {
            self.targets += 1;
        }

        fn draw_batch(&mut self, batch: &Batch<'_>) {
            self.batches.push((batch.kind, batch.vertex_count, batch.vertices.to_vec()));
        }

        fn present(&mut self, _surface: &()) {
            self.presents += 1;
        }

        fn upload_glyph_atlas(&mut self, width: u32, height: u32, pixels: &[u8]) {
            self.atlas = Some((width, height, pixels.len()));
        }

        fn read_attachment(&self, _name: &str, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>, ReadbackError> {
            let (tw, th) = self.size;
            if x + width > tw || y + height > th {
                return Err(ReadbackError::OutOfBounds { x, y, width, height, target_width: tw, target_height: th });
            }
            let mut out = Vec::new();
            for row in y..y + height {
                let start = ((row * tw + x) * 4) as usize;
                out.extend_from_slice(&self.ids[start..start + (width * 4) as usize]);
            }
            Ok(out)
        }

        fn target_size(&self) -> (u32, u32) {
            self.size
        }
    }

    struct FixedMetrics {
        glyphs: HashMap<char, Glyph>,
    }

    impl GlyphMetrics for FixedMetrics {
        fn glyph(&self, ch: char) -> Option<Glyph> {
            self.glyphs.get(&ch).copied()
        }

        fn scale(&self, size: f32) -> f32 {
            size / 100.0
        }

        fn line_height(&self) -> f32 {
            120.0
        }

        fn atlas_size(&self) -> (u32, u32) {
            (200, 100)
        }
    }

    fn metrics() -> FixedMetrics {
        let a = Glyph {
            advance: 60.0,
            lsb: 5.0,
            rsb: 5.0,
            width: 50.0,
            height: 70.0,
            bearing_y: 0.0,
            atlas: AtlasBounds { left: 20.0, top: 10.0, right: 70.0, bottom: 80.0 },
        };
        let space = Glyph { width: 0.0, height: 0.0, lsb: 0.0, rsb: 30.0, ..a };
        FixedMetrics { glyphs: HashMap::from([('a', a), (' ', space)]) }
    }

    fn renderer(config: BatchConfig) -> BatchRenderer<Recording> {
        BatchRenderer::new(Recording::with_target(4, 3), config)
    }

    fn position(record: &[u8]) -> [f32; 3] {
        bytemuck::pod_read_unaligned(&record[..12])
    }

    fn translate(g: &GlyphQuad) -> Vec3 {
        g.transform.translate.unwrap_or(Vec3::new(0.0, 0.0, 0.0))
    }

    #[test]
    fn draws_are_staged_until_flush() {
        let mut r = renderer(BatchConfig::default());
        r.begin_scene(Mat4::identity(), Mat4::identity());
        for i in 0..3 {
            r.draw_line(&Line::new(Vec2::new(i as f32, 0.0), 1.0, 0.0));
        }
        r.draw_circle(&Circle::new(Vec2::zero(), 0.5));

        assert_eq!(r.staged(PrimitiveKind::Quad), 3);
        assert_eq!(r.staged(PrimitiveKind::Circle), 1);
        assert!(r.backend().batches.is_empty());
        assert_eq!(r.backend().targets, 1);
    }

    #[test]
    fn full_kind_flushes_before_the_next_push() {
        let mut r = renderer(BatchConfig { circle_capacity: 100, ..BatchConfig::default() });
        r.begin_scene(Mat4::identity(), Mat4::identity());
        for _ in 0..101 {
            r.draw_circle(&Circle::new(Vec2::zero(), 1.0));
        }

        let batches = &r.backend().batches;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].0, PrimitiveKind::Circle);
        assert_eq!(batches[0].1, 600);
        assert_eq!(r.staged(PrimitiveKind::Circle), 1);
    }

    #[test]
    fn end_scene_flushes_in_kind_order_and_presents() {
        let mut r = renderer(BatchConfig::default());
        r.begin_scene(Mat4::identity(), Mat4::identity());
        r.draw_text(&Text::new(Vec2::zero(), "ab"));
        r.draw_circle(&Circle::new(Vec2::zero(), 1.0));
        r.draw_line(&Line::new(Vec2::zero(), 1.0, 0.0));
        r.end_scene(&());

        let kinds: Vec<PrimitiveKind> = r.backend().batches.iter().map(|b| b.0).collect();
        assert_eq!(kinds, vec![PrimitiveKind::Quad, PrimitiveKind::Circle, PrimitiveKind::Text]);
        for kind in PrimitiveKind::ALL {
            assert_eq!(r.staged(kind), 0);
        }
        assert_eq!(r.backend().presents, 1);
        assert!(!r.is_scene_open());
    }

    #[test]
    fn stats_count_flush_operations() {
        let mut r = renderer(BatchConfig { quad_capacity: 2, ..BatchConfig::default() });
        r.begin_scene(Mat4::identity(), Mat4::identity());
        for _ in 0..5 {
            r.draw_line(&Line::new(Vec2::zero(), 1.0, 0.0));
        }
        r.end_scene(&());

        let stats = r.stats();
        assert_eq!(stats.quads.primitives, 5);
        assert_eq!(stats.quads.batches, 3);
        assert_eq!(stats.circles.batches, 0);
        assert_eq!(stats.total_batches(), 3);

        r.begin_scene(Mat4::identity(), Mat4::identity());
        assert_eq!(r.stats(), FrameStats::default());
    }

    #[test]
    fn stats_start_over_at_the_next_scene() {
        let mut r = renderer(BatchConfig::default());
        r.begin_scene(Mat4::identity(), Mat4::identity());
        r.draw_line(&Line::new(Vec2::zero(), 1.0, 0.0));
        r.draw_circle(&Circle::new(Vec2::zero(), 1.0));
        r.end_scene(&());
        assert_eq!(r.stats().total_primitives(), 2);

        r.begin_scene(Mat4::identity(), Mat4::identity());
        assert_eq!(r.stats(), FrameStats::default());
        assert_eq!(r.backend().targets, 2);
    }

    #[test]
    fn empty_scene_leaves_nothing_staged() {
        let mut r = renderer(BatchConfig::default());
        r.begin_scene(Mat4::identity(), Mat4::identity());
        r.end_scene(&());

        for kind in PrimitiveKind::ALL {
            assert_eq!(r.staged(kind), 0);
        }
        assert!(r.backend().batches.is_empty());
        assert_eq!(r.backend().presents, 1);
        assert_eq!(r.stats(), FrameStats::default());
        assert!(!r.is_scene_open());
    }

    #[test]
    fn line_quad_spans_the_segment_on_the_painting_layer() {
        let mut r = renderer(BatchConfig::default());
        r.begin_scene(Mat4::identity(), Mat4::identity());
        r.draw_line(&Line::new(Vec2::new(1.0, 0.0), 2.0, 0.0).with_id(EntityId(5)));
        r.end_scene(&());

        let (_, count, bytes) = &r.backend().batches[0];
        assert_eq!(*count, 6);
        let stride = 28;
        let tl = position(&bytes[..stride]);
        let br = position(&bytes[4 * stride..5 * stride]);
        assert!((tl[0] - 1.0).abs() < 1e-5 && (tl[1] - 0.05).abs() < 1e-5);
        assert!((br[0] - 3.0).abs() < 1e-5 && (br[1] + 0.05).abs() < 1e-5);
        assert_eq!(tl[2], -1.0);

        let id: u32 = bytemuck::pod_read_unaligned(&bytes[24..28]);
        assert_eq!(id, 5);
    }

    #[test]
    fn circle_records_carry_masks_in_winding_order() {
        let mut r = renderer(BatchConfig::default());
        r.begin_scene(Mat4::identity(), Mat4::identity());
        r.draw_circle(&Circle::new(Vec2::zero(), 1.0));
        r.end_scene(&());

        let (_, _, bytes) = &r.backend().batches[0];
        let masks: Vec<[f32; 2]> = bytes
            .chunks_exact(36)
            .map(|rec| bytemuck::pod_read_unaligned(&rec[24..32]))
            .collect();
        assert_eq!(masks, WINDING.iter().map(|c| MASK[c.index()]).collect::<Vec<_>>());
    }

    #[test]
    fn draws_outside_a_scene_are_dropped() {
        let mut r = renderer(BatchConfig::default());
        r.draw_line(&Line::new(Vec2::zero(), 1.0, 0.0));
        assert_eq!(r.staged(PrimitiveKind::Quad), 0);

        r.end_scene(&());
        assert!(r.backend().batches.is_empty());
        assert_eq!(r.backend().presents, 1);
    }

    #[test]
    fn text_stages_one_quad_per_visible_character() {
        let mut r = renderer(BatchConfig::default());
        r.set_glyph_metrics(Box::new(metrics()));
        r.begin_scene(Mat4::identity(), Mat4::identity());
        r.draw(&Text::new(Vec2::zero(), "a a\na").into());
        assert_eq!(r.staged(PrimitiveKind::Text), 4);
        assert_eq!(r.staged(PrimitiveKind::Quad), 0);
    }

    #[test]
    fn newline_returns_to_the_start_and_moves_down() {
        let m = metrics();
        let text = Text::new(Vec2::new(1.0, 2.0), "aa\na").with_size(1.0);
        let quads = layout_text(&text, Some(&m));
        assert_eq!(quads.len(), 3);

        // scale 0.01: width 0.5, height 0.7.
        let first = translate(&quads[0]);
        assert!((first.x - 1.25).abs() < 1e-5);
        assert!((first.y - 2.35).abs() < 1e-5);

        // Advance of the first glyph skips its lsb: (0 + 50 + 5) * 0.01.
        let second = translate(&quads[1]);
        assert!((second.x - (1.0 + 0.55 + 0.05 + 0.25)).abs() < 1e-5);

        // A new line returns to x but keeps the glyph's bearing.
        let third = translate(&quads[2]);
        assert!((third.x - (1.0 + 0.05 + 0.25)).abs() < 1e-5);
        assert!((third.y - (2.35 - 1.2)).abs() < 1e-5);
    }

    #[test]
    fn only_the_first_glyph_of_the_text_drops_its_bearing() {
        let m = metrics();
        let quads = layout_text(&Text::new(Vec2::zero(), "a\na\na").with_size(1.0), Some(&m));
        let xs: Vec<f32> = quads.iter().map(|q| translate(q).x).collect();
        assert!((xs[0] - 0.25).abs() < 1e-5);
        assert!((xs[1] - 0.30).abs() < 1e-5);
        assert!((xs[2] - 0.30).abs() < 1e-5);
    }

    #[test]
    fn glyph_uvs_come_from_atlas_bounds() {
        let m = metrics();
        let quads = layout_text(&Text::new(Vec2::zero(), "a"), Some(&m));
        assert_eq!(quads[0].uv, [[0.1, 0.1], [0.35, 0.1], [0.1, 0.8], [0.35, 0.8]]);
    }

    #[test]
    fn space_samples_the_blank_rect() {
        let m = metrics();
        let quads = layout_text(&Text::new(Vec2::zero(), "a a"), Some(&m));
        let (u0, v0, u1, v1) = BLANK_UV;
        assert_eq!(quads[1].uv, [[u0, v0], [u1, v0], [u0, v1], [u1, v1]]);
    }

    #[test]
    fn missing_glyphs_use_unit_metrics() {
        let quads = layout_text(&Text::new(Vec2::zero(), "xy"), None);
        assert_eq!(quads.len(), 2);
        let scale = quads[0].transform.scale.unwrap_or(Vec3::new(0.0, 0.0, 0.0));
        assert_eq!((scale.x, scale.y), (1.0, 1.0));
        // First: lsb 0, advance 0 + 1 + 1. Second: offset by its lsb of 1.
        assert!((translate(&quads[0]).x - 0.5).abs() < 1e-6);
        assert!((translate(&quads[1]).x - 3.5).abs() < 1e-6);
    }

    #[test]
    fn pick_flips_window_rows() {
        let mut r = renderer(BatchConfig::default());
        let (w, _) = r.backend().size;
        // Target row 2 is the top window row.
        let at = ((2 * w + 1) * 4) as usize;
        r.backend_mut().ids[at..at + 4].copy_from_slice(&42u32.to_le_bytes());

        let reader = r.id_reader();
        assert_eq!(reader.pick(1, 0).ok(), Some(EntityId(42)));
        assert_eq!(reader.pick(1, 2).ok(), Some(EntityId::NONE));
        assert!(matches!(reader.pick(4, 0), Err(ReadbackError::OutOfBounds { .. })));
        assert_eq!(reader.read_buffer().map(|b| b.len()).ok(), Some(48));
    }
}
