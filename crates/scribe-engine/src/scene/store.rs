use crate::render::{BatchRenderer, RenderBackend};

use super::{Circle, Drawable, EntityId, Line, Text, joint_circles};

/// Authoritative primitive lists, re-submitted to the renderer every frame.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    lines: Vec<Line>,
    circles: Vec<Circle>,
    texts: Vec<Text>,
}

impl Scene {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, drawable: impl Into<Drawable>) {
        match drawable.into() {
            Drawable::Line(l) => self.lines.push(l),
            Drawable::Circle(c) => self.circles.push(c),
            Drawable::Text(t) => self.texts.push(t),
        }
    }

    pub fn extend_lines(&mut self, lines: impl IntoIterator<Item = Line>) {
        self.lines.extend(lines);
    }

    #[inline]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    #[inline]
    pub fn circles(&self) -> &[Circle] {
        &self.circles
    }

    #[inline]
    pub fn texts(&self) -> &[Text] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.lines.len() + self.circles.len() + self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.circles.clear();
        self.texts.clear();
    }

    /// Looks up the primitive carrying `id`.
    pub fn find(&self, id: EntityId) -> Option<Drawable> {
        if id.is_none() {
            return None;
        }
        self.lines
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .map(Drawable::from)
            .or_else(|| self.circles.iter().find(|c| c.id == id).cloned().map(Drawable::from))
            .or_else(|| self.texts.iter().find(|t| t.id == id).cloned().map(Drawable::from))
    }

    /// Draws lines, their joints, circles, then texts.
    ///
    /// Joint radius is half the renderer's line thickness.
    pub fn submit<B: RenderBackend>(&self, renderer: &mut BatchRenderer<B>) {
        for line in &self.lines {
            renderer.draw_line(line);
        }
        let radius = renderer.config().line_thickness / 2.0;
        for joint in joint_circles(&self.lines, radius) {
            renderer.draw_circle(&joint);
        }
        for circle in &self.circles {
            renderer.draw_circle(circle);
        }
        for text in &self.texts {
            renderer.draw_text(text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Vec2};
    use crate::render::batch::{Batch, BatchConfig, PrimitiveKind};
    use crate::render::framebuffer::ReadbackError;
    use crate::scene::{IdGenerator, Polyline, Rgb};

    #[derive(Default)]
    struct Counting {
        vertices: Vec<(PrimitiveKind, u32)>,
    }

    impl RenderBackend for Counting {
        type Surface = ();

        fn begin_target(&mut self, _background: Rgb) {}

        fn draw_batch(&mut self, batch: &Batch<'_>) {
            self.vertices.push((batch.kind, batch.vertex_count));
        }

        fn present(&mut self, _surface: &()) {}

        fn upload_glyph_atlas(&mut self, _width: u32, _height: u32, _pixels: &[u8]) {}

        fn read_attachment(&self, _: &str, _: u32, _: u32, _: u32, _: u32) -> Result<Vec<u8>, ReadbackError> {
            Ok(Vec::new())
        }

        fn target_size(&self) -> (u32, u32) {
            (1, 1)
        }
    }

    #[test]
    fn find_searches_every_kind() {
        let mut scene = Scene::new();
        scene.push(Line::new(Vec2::zero(), 1.0, 0.0).with_id(EntityId(1)));
        scene.push(Circle::new(Vec2::zero(), 1.0).with_id(EntityId(2)));
        scene.push(Text::new(Vec2::zero(), "hi").with_id(EntityId(3)));

        assert_eq!(scene.len(), 3);
        assert!(matches!(scene.find(EntityId(2)), Some(Drawable::Circle(_))));
        assert!(matches!(scene.find(EntityId(3)), Some(Drawable::Text(_))));
        assert!(scene.find(EntityId(4)).is_none());
    }

    #[test]
    fn submit_adds_one_joint_per_polyline_corner() {
        let ids = IdGenerator::new();
        let mut polyline = Polyline::start(0, Vec2::zero(), Rgb::WHITE, &ids);
        for p in [Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)] {
            polyline.commit(p, &ids);
        }

        let mut scene = Scene::new();
        scene.extend_lines(polyline.finish());
        scene.push(Circle::new(Vec2::new(3.0, 3.0), 0.2));

        let mut renderer = BatchRenderer::new(Counting::default(), BatchConfig::default());
        renderer.begin_scene(Mat4::identity(), Mat4::identity());
        scene.submit(&mut renderer);
        renderer.end_scene(&());

        // Three segments, two joints plus the free circle.
        assert_eq!(
            renderer.backend().vertices,
            vec![(PrimitiveKind::Quad, 18), (PrimitiveKind::Circle, 18)]
        );
    }
}
