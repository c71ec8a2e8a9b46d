use bevy_math::Vec3;

use geometry::{Line, Plane};

use crate::solver_1d::optimize_on_line;
use crate::EPSILON;

/// Optimizes on the disk where the ball of `radius` meets plane `plane_no`,
/// subject to all earlier planes. Returns `None` when no point on the plane
/// satisfies the constraints.
pub(crate) fn optimize_on_plane(
    planes: &[Plane],
    plane_no: usize,
    radius: f32,
    opt_velocity: Vec3,
    direction_opt: bool,
) -> Option<Vec3> {
    let plane = &planes[plane_no];
    let plane_dist = plane.point.dot(plane.normal);
    let plane_dist_sq = plane_dist * plane_dist;
    let radius_sq = radius * radius;

    if plane_dist_sq > radius_sq {
        // The ball misses the plane entirely.
        return None;
    }

    let plane_radius_sq = radius_sq - plane_dist_sq;
    let plane_center = plane_dist * plane.normal;

    let mut result = if direction_opt {
        // Project the optimization direction onto the plane and head for the
        // rim of the disk.
        let plane_opt_velocity = opt_velocity - opt_velocity.dot(plane.normal) * plane.normal;
        let length_sq = plane_opt_velocity.length_squared();

        if length_sq <= EPSILON {
            plane_center
        } else {
            plane_center + (plane_radius_sq / length_sq).sqrt() * plane_opt_velocity
        }
    } else {
        // Drop the perpendicular from the optimization point onto the plane.
        let mut candidate =
            opt_velocity + (plane.point - opt_velocity).dot(plane.normal) * plane.normal;

        // If outside the disk, clamp onto its rim.
        if candidate.length_squared() > radius_sq {
            let from_center = candidate - plane_center;
            let from_center_length_sq = from_center.length_squared();
            candidate = plane_center + (plane_radius_sq / from_center_length_sq).sqrt() * from_center;
        }

        candidate
    };

    for i in 0..plane_no {
        if planes[i].signed_distance(result) < 0.0 {
            // The candidate violates an earlier plane; restrict the problem
            // to the intersection line of that plane with this one.
            let cross_product = planes[i].normal.cross(plane.normal);

            if cross_product.length_squared() <= EPSILON {
                // The planes are (almost) parallel and the earlier one fully
                // occludes plane `plane_no`.
                return None;
            }

            let line_direction = cross_product.normalize();
            let line_normal = line_direction.cross(plane.normal);
            let line_point = plane.point
                + ((planes[i].point - plane.point).dot(planes[i].normal)
                    / line_normal.dot(planes[i].normal))
                    * line_normal;
            let line = Line::new(line_point, line_direction);

            result = optimize_on_line(planes, i, &line, radius, opt_velocity, direction_opt)?;
        }
    }

    Some(result)
}
