use crate::math::{Vec2, to_radians};

use super::{EntityId, Rgb};

/// Straight segment drawn as an oriented quad.
///
/// `position` is the start point; the segment runs `length` world units
/// along `rotate` degrees (counter-clockwise from +X). A negative length
/// runs backwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub position: Vec2,
    pub color: Rgb,
    pub id: EntityId,
    pub length: f32,
    pub rotate: f32,
    /// Polyline the segment belongs to, [`Line::NO_GROUP`] when standalone.
    pub group: i32,
}

impl Line {
    pub const NO_GROUP: i32 = -1;

    pub fn new(position: Vec2, length: f32, rotate: f32) -> Self {
        Self {
            position,
            color: Rgb::WHITE,
            id: EntityId::NONE,
            length,
            rotate,
            group: Self::NO_GROUP,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn with_group(mut self, group: i32) -> Self {
        self.group = group;
        self
    }

    /// Unit vector along the segment.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        let (s, c) = to_radians(self.rotate).sin_cos();
        Vec2::new(c, s)
    }

    /// Far endpoint.
    pub fn end(&self) -> Vec2 {
        self.position + self.direction() * self.length
    }

    /// Midpoint, where the quad is centered.
    pub fn center(&self) -> Vec2 {
        self.position + self.direction() * (self.length / 2.0)
    }

    #[inline]
    pub fn is_grouped(&self) -> bool {
        self.group >= 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub position: Vec2,
    pub color: Rgb,
    pub id: EntityId,
    pub radius: f32,
}

impl Circle {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self { position, color: Rgb::WHITE, id: EntityId::NONE, radius }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }
}

/// Text run. `position` is the baseline origin of the first line.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub position: Vec2,
    pub color: Rgb,
    pub id: EntityId,
    pub content: String,
    /// Em size in world units.
    pub size: f32,
}

impl Text {
    pub const DEFAULT_SIZE: f32 = 0.48;

    pub fn new(position: Vec2, content: impl Into<String>) -> Self {
        Self {
            position,
            color: Rgb::WHITE,
            id: EntityId::NONE,
            content: content.into(),
            size: Self::DEFAULT_SIZE,
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn with_size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }
}

/// One renderable primitive.
///
/// Adding a kind means adding a variant here and a matching arm in
/// `BatchRenderer::draw`.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Line(Line),
    Circle(Circle),
    Text(Text),
}

impl Drawable {
    pub fn id(&self) -> EntityId {
        match self {
            Drawable::Line(l) => l.id,
            Drawable::Circle(c) => c.id,
            Drawable::Text(t) => t.id,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            Drawable::Line(l) => l.position,
            Drawable::Circle(c) => c.position,
            Drawable::Text(t) => t.position,
        }
    }

    pub fn color(&self) -> Rgb {
        match self {
            Drawable::Line(l) => l.color,
            Drawable::Circle(c) => c.color,
            Drawable::Text(t) => t.color,
        }
    }
}

impl From<Line> for Drawable {
    fn from(v: Line) -> Self {
        Drawable::Line(v)
    }
}

impl From<Circle> for Drawable {
    fn from(v: Circle) -> Self {
        Drawable::Circle(v)
    }
}

impl From<Text> for Drawable {
    fn from(v: Text) -> Self {
        Drawable::Text(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5
    }

    #[test]
    fn line_end_follows_rotation() {
        let line = Line::new(Vec2::new(1.0, 1.0), 2.0, 90.0);
        assert!(close(line.end(), Vec2::new(1.0, 3.0)));
        assert!(close(line.center(), Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn negative_length_runs_backwards() {
        let line = Line::new(Vec2::zero(), -1.0, 0.0);
        assert!(close(line.end(), Vec2::new(-1.0, 0.0)));
    }

    #[test]
    fn drawable_exposes_common_fields() {
        let d: Drawable = Circle::new(Vec2::new(3.0, 4.0), 1.0).with_id(EntityId(9)).into();
        assert_eq!(d.id(), EntityId(9));
        assert_eq!(d.position(), Vec2::new(3.0, 4.0));
        assert_eq!(d.color(), Rgb::WHITE);
    }
}
