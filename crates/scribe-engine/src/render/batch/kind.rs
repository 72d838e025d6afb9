use crate::gpu::Semantic;
use crate::render::ProgramKind;

/// Primitive kinds with their own staging buffer and program.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum PrimitiveKind {
    Quad,
    Circle,
    Text,
}

impl PrimitiveKind {
    pub const COUNT: usize = 3;
    /// Flush order.
    pub const ALL: [PrimitiveKind; Self::COUNT] = [PrimitiveKind::Quad, PrimitiveKind::Circle, PrimitiveKind::Text];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            PrimitiveKind::Quad => 0,
            PrimitiveKind::Circle => 1,
            PrimitiveKind::Text => 2,
        }
    }

    #[inline]
    pub const fn program(self) -> ProgramKind {
        match self {
            PrimitiveKind::Quad => ProgramKind::Quad,
            PrimitiveKind::Circle => ProgramKind::Circle,
            PrimitiveKind::Text => ProgramKind::Text,
        }
    }

    /// Per-corner field carried on top of position, color and id.
    #[inline]
    pub const fn extra(self) -> Option<Semantic> {
        match self {
            PrimitiveKind::Quad => None,
            PrimitiveKind::Circle => Some(Semantic::Mask),
            PrimitiveKind::Text => Some(Semantic::TexCoord),
        }
    }
}
