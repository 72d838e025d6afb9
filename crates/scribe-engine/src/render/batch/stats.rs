use super::PrimitiveKind;

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct KindStats {
    /// Primitives submitted to the GPU.
    pub primitives: u32,
    /// Flush operations that drew at least one primitive.
    pub batches: u32,
}

/// Per-frame counters, reset by `begin_scene`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct FrameStats {
    pub quads: KindStats,
    pub circles: KindStats,
    pub glyphs: KindStats,
}

impl FrameStats {
    pub fn kind(&self, kind: PrimitiveKind) -> KindStats {
        match kind {
            PrimitiveKind::Quad => self.quads,
            PrimitiveKind::Circle => self.circles,
            PrimitiveKind::Text => self.glyphs,
        }
    }

    pub fn total_batches(&self) -> u32 {
        self.quads.batches + self.circles.batches + self.glyphs.batches
    }

    pub fn total_primitives(&self) -> u32 {
        self.quads.primitives + self.circles.primitives + self.glyphs.primitives
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn record(&mut self, kind: PrimitiveKind, primitives: usize) {
        let entry = match kind {
            PrimitiveKind::Quad => &mut self.quads,
            PrimitiveKind::Circle => &mut self.circles,
            PrimitiveKind::Text => &mut self.glyphs,
        };
        entry.primitives += primitives as u32;
        entry.batches += 1;
    }
}
