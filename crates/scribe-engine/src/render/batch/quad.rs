//! Unit-quad geometry shared by every primitive kind.

use crate::math::{Mat4, Vec3, Vec4};

pub const VERTICES_PER_QUAD: usize = 6;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Two triangles: `TL, TR, BL` then `TR, BR, BL`.
pub const WINDING: [Corner; VERTICES_PER_QUAD] = [
    Corner::TopLeft,
    Corner::TopRight,
    Corner::BottomLeft,
    Corner::TopRight,
    Corner::BottomRight,
    Corner::BottomLeft,
];

impl Corner {
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomLeft => 2,
            Corner::BottomRight => 3,
        }
    }

    /// Corner of the unit quad centered on the origin.
    #[inline]
    pub const fn local(self) -> (f32, f32) {
        match self {
            Corner::TopLeft => (-0.5, 0.5),
            Corner::TopRight => (0.5, 0.5),
            Corner::BottomLeft => (-0.5, -0.5),
            Corner::BottomRight => (0.5, -0.5),
        }
    }

    /// Disc mask coordinate in `{0, 1}²`.
    #[inline]
    pub const fn mask(self) -> [f32; 2] {
        match self {
            Corner::TopLeft => [0.0, 1.0],
            Corner::TopRight => [1.0, 1.0],
            Corner::BottomLeft => [0.0, 0.0],
            Corner::BottomRight => [1.0, 0.0],
        }
    }
}

/// Per-corner mask coordinates, indexed by [`Corner::index`].
pub const MASK: [[f32; 2]; 4] = [
    Corner::TopLeft.mask(),
    Corner::TopRight.mask(),
    Corner::BottomLeft.mask(),
    Corner::BottomRight.mask(),
];

/// Optional translate/rotate/scale applied to the unit quad, always in the
/// order scale, then rotate, then translate.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct QuadTransform {
    pub translate: Option<Vec3>,
    /// Radians about the drawing-plane normal.
    pub rotate: Option<f32>,
    pub scale: Option<Vec3>,
}

impl QuadTransform {
    pub fn model(&self) -> Mat4 {
        let mut m = Mat4::identity();
        if let Some(s) = self.scale {
            m = Mat4::scale(s.x, s.y, s.z) * m;
        }
        if let Some(r) = self.rotate {
            m = Mat4::rotation_xyz(r, 0.0, 0.0) * m;
        }
        if let Some(t) = self.translate {
            m = Mat4::translation(t.x, t.y, t.z) * m;
        }
        m
    }

    /// Transformed corners on the plane `z = layer`, indexed by [`Corner::index`].
    pub fn corners(&self, layer: f32) -> [Vec4; 4] {
        let model = self.model();
        [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight].map(|c| {
            let (x, y) = c.local();
            model.transform(Vec4::point(x, y, layer))
        })
    }
}
