use bevy_math::Vec3;

use geometry::Plane;

use crate::solver_3d::{incremental_optimization, OptimizationResult};
use crate::EPSILON;

/// Relaxes an infeasible program starting at `begin_plane`.
///
/// Each plane that the current result violates by more than the running
/// worst-case `distance` is softened: the other planes are projected onto it
/// and the result moves as far along the plane's normal as the projected
/// constraints allow. The outcome is the velocity whose worst violation is
/// minimal under the relaxation.
pub(crate) fn relaxed_optimization(
    planes: &[Plane],
    begin_plane: usize,
    radius: f32,
    mut result: Vec3,
) -> Vec3 {
    let mut distance = 0.0;

    for i in begin_plane..planes.len() {
        if -planes[i].signed_distance(result) > distance {
            let mut proj_planes: Vec<Plane> = Vec::with_capacity(i);

            for j in 0..i {
                let cross_product = planes[j].normal.cross(planes[i].normal);

                let point = if cross_product.length_squared() <= EPSILON {
                    // Planes i and j are (almost) parallel.
                    if planes[i].normal.dot(planes[j].normal) > 0.0 {
                        // Same direction; plane j adds nothing here.
                        continue;
                    }

                    // Opposite direction; split the difference.
                    0.5 * (planes[i].point + planes[j].point)
                } else {
                    // A point on the intersection line of planes i and j.
                    let line_normal = cross_product.cross(planes[i].normal);
                    planes[i].point
                        + ((planes[j].point - planes[i].point).dot(planes[j].normal)
                            / line_normal.dot(planes[j].normal))
                            * line_normal
                };

                proj_planes.push(Plane::new(
                    point,
                    (planes[j].normal - planes[i].normal).normalize(),
                ));
            }

            if let OptimizationResult::Feasible { optimal_velocity } =
                incremental_optimization(&proj_planes, radius, planes[i].normal, true)
            {
                result = optimal_velocity;
            }
            // An infeasible outcome here can only be a floating-point
            // anomaly; the previous result is kept.

            distance = -planes[i].signed_distance(result);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_unreachable_plane_yields_normal_direction() {
        // The plane demands y >= 3, unreachable inside the unit ball; the
        // least-violating velocity heads straight along the plane normal.
        let planes = [Plane::new(Vec3::new(0.0, 3.0, 0.0), Vec3::Y)];

        let result = relaxed_optimization(&planes, 0, 1.0, Vec3::ZERO);

        assert_eq!(result, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_opposing_planes_balance_in_the_middle() {
        let planes = [
            Plane::new(Vec3::new(0.0, 3.0, 0.0), Vec3::Y),
            Plane::new(Vec3::new(0.0, -3.0, 0.0), -Vec3::Y),
        ];

        let result = relaxed_optimization(&planes, 0, 1.0, Vec3::ZERO);

        assert!(result.length() < 1e-5);
    }
}
