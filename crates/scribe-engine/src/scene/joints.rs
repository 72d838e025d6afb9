//! Joint circles that round off the corners of a polyline.

use super::{Circle, Line};

/// Yields one joint per pair of consecutive segments of the same polyline.
///
/// Each joint sits on the first segment's computed end point and takes that
/// segment's color and id, so picking a joint selects the segment it closes.
pub fn joint_circles(lines: &[Line], radius: f32) -> impl Iterator<Item = Circle> + '_ {
    lines
        .windows(2)
        .filter(|pair| pair[0].is_grouped() && pair[0].group == pair[1].group)
        .map(move |pair| {
            let first = &pair[0];
            Circle::new(first.end(), radius).with_color(first.color).with_id(first.id)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec2;
    use crate::scene::EntityId;

    #[test]
    fn joint_sits_exactly_on_first_endpoint() {
        let a = Line::new(Vec2::new(0.0, 0.0), 1.5, 30.0).with_group(0).with_id(EntityId(1));
        let b = Line::new(a.end(), 2.0, 120.0).with_group(0).with_id(EntityId(2));

        let joints: Vec<Circle> = joint_circles(&[a.clone(), b], 0.05).collect();
        assert_eq!(joints.len(), 1);
        assert_eq!(joints[0].position, a.end());
        assert_eq!(joints[0].radius, 0.05);
        assert_eq!(joints[0].id, EntityId(1));
    }

    #[test]
    fn no_joint_across_groups_or_for_standalone_lines() {
        let lines = [
            Line::new(Vec2::zero(), 1.0, 0.0).with_group(0),
            Line::new(Vec2::new(1.0, 0.0), 1.0, 0.0).with_group(1),
            Line::new(Vec2::new(2.0, 0.0), 1.0, 0.0),
            Line::new(Vec2::new(3.0, 0.0), 1.0, 0.0),
        ];
        assert_eq!(joint_circles(&lines, 0.05).count(), 0);
    }
}
