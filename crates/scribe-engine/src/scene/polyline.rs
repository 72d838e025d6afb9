use crate::math::{Vec2, screen::line_angle};

use super::{IdGenerator, Line, Rgb};

/// Interactive polyline editing: every click fixes the current segment and
/// starts the next one at the click point.
///
/// The trailing segment follows the cursor through [`aim`](Self::aim) and is
/// dropped by [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct Polyline {
    group: i32,
    color: Rgb,
    segments: Vec<Line>,
}

impl Polyline {
    /// Length of a freshly started segment, before the cursor moves.
    pub const STUB_LENGTH: f32 = 0.01;

    pub fn start(group: i32, at: Vec2, color: Rgb, ids: &IdGenerator) -> Self {
        let mut polyline = Self { group, color, segments: Vec::new() };
        polyline.push_stub(at, ids);
        polyline
    }

    #[inline]
    pub fn group(&self) -> i32 {
        self.group
    }

    /// Segments including the one being aimed.
    #[inline]
    pub fn segments(&self) -> &[Line] {
        &self.segments
    }

    /// Points the trailing segment at `target`.
    pub fn aim(&mut self, target: Vec2) {
        let Some(last) = self.segments.last_mut() else { return };
        let d = target - last.position;
        if d.x == 0.0 && d.y == 0.0 {
            return;
        }
        last.length = d.x.hypot(d.y);
        last.rotate = line_angle(d.x, d.y);
    }

    /// Fixes the trailing segment at `point` and starts a new one there.
    pub fn commit(&mut self, point: Vec2, ids: &IdGenerator) {
        self.aim(point);
        let start = self.segments.last().map(Line::end).unwrap_or(point);
        self.push_stub(start, ids);
    }

    /// Completed segments, without the trailing one.
    pub fn finish(mut self) -> Vec<Line> {
        self.segments.pop();
        self.segments
    }

    fn push_stub(&mut self, at: Vec2, ids: &IdGenerator) {
        self.segments.push(
            Line::new(at, Self::STUB_LENGTH, 0.0)
                .with_color(self.color)
                .with_group(self.group)
                .with_id(ids.next_id()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::joint_circles;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a.x - b.x).abs() < 1e-5 && (a.y - b.y).abs() < 1e-5
    }

    #[test]
    fn commit_chains_segments_end_to_start() {
        let ids = IdGenerator::new();
        let mut poly = Polyline::start(3, Vec2::zero(), Rgb::WHITE, &ids);

        poly.aim(Vec2::new(0.5, 0.5));
        poly.commit(Vec2::new(1.0, 0.0), &ids);
        poly.commit(Vec2::new(1.0, 2.0), &ids);
        assert_eq!(poly.segments().len(), 3);

        let lines = poly.finish();
        assert_eq!(lines.len(), 2);
        assert!((lines[0].length - 1.0).abs() < 1e-5);
        assert!(lines[0].rotate.abs() < 1e-4);
        assert!((lines[1].rotate - 90.0).abs() < 1e-4);
        assert!(close(lines[1].position, lines[0].end()));
        assert!(lines.iter().all(|l| l.group == 3));
        assert_ne!(lines[0].id, lines[1].id);

        assert_eq!(joint_circles(&lines, 0.05).count(), 1);
    }

    #[test]
    fn aiming_at_the_start_keeps_the_segment() {
        let ids = IdGenerator::new();
        let mut poly = Polyline::start(0, Vec2::new(1.0, 1.0), Rgb::WHITE, &ids);
        poly.aim(Vec2::new(1.0, 1.0));
        assert_eq!(poly.segments()[0].length, Polyline::STUB_LENGTH);
    }
}
