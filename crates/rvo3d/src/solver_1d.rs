use bevy_math::Vec3;

use geometry::{Line, Plane};

use crate::EPSILON;

/// Optimizes on the segment of `line` inside the ball of `radius`, subject
/// to the first `plane_count` planes. Returns `None` when the segment is
/// empty.
pub(crate) fn optimize_on_line(
    planes: &[Plane],
    plane_count: usize,
    line: &Line,
    radius: f32,
    opt_velocity: Vec3,
    direction_opt: bool,
) -> Option<Vec3> {
    let dot_product = line.point.dot(line.direction);
    let discriminant = dot_product * dot_product + radius * radius - line.point.length_squared();

    if discriminant < 0.0 {
        // The ball misses the line entirely.
        return None;
    }

    let sqrt_discriminant = discriminant.sqrt();
    let mut t_left = -dot_product - sqrt_discriminant;
    let mut t_right = -dot_product + sqrt_discriminant;

    for plane in &planes[..plane_count] {
        let numerator = (plane.point - line.point).dot(plane.normal);
        let denominator = line.direction.dot(plane.normal);

        if denominator * denominator <= EPSILON {
            // The line is (almost) parallel to this plane.
            if numerator > 0.0 {
                return None;
            }

            continue;
        }

        let t = numerator / denominator;

        if denominator >= 0.0 {
            // The plane bounds the segment on the left.
            t_left = t_left.max(t);
        } else {
            // The plane bounds the segment on the right.
            t_right = t_right.min(t);
        }

        if t_left > t_right {
            return None;
        }
    }

    let t = if direction_opt {
        if opt_velocity.dot(line.direction) > 0.0 {
            t_right
        } else {
            t_left
        }
    } else {
        line.direction
            .dot(opt_velocity - line.point)
            .clamp(t_left, t_right)
    };

    Some(line.point + t * line.direction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_point_clamps_to_ball() {
        let line = Line::new(Vec3::ZERO, Vec3::X);

        let result = optimize_on_line(&[], 0, &line, 2.0, Vec3::new(5.0, 1.0, 0.0), false);

        assert_eq!(result, Some(Vec3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn test_line_outside_ball_fails() {
        let line = Line::new(Vec3::new(0.0, 3.0, 0.0), Vec3::X);

        let result = optimize_on_line(&[], 0, &line, 1.0, Vec3::ZERO, false);

        assert_eq!(result, None);
    }

    #[test]
    fn test_earlier_plane_clips_interval() {
        let line = Line::new(Vec3::ZERO, Vec3::X);
        let planes = [Plane::new(Vec3::new(1.0, 0.0, 0.0), Vec3::X)];

        // The plane permits x >= 1, so the left extreme moves to t = 1.
        let result = optimize_on_line(&planes, 1, &line, 2.0, Vec3::new(-5.0, 0.0, 0.0), false);

        assert_eq!(result, Some(Vec3::new(1.0, 0.0, 0.0)));
    }
}
