use bevy_math::Vec3;

use geometry::Plane;

use crate::solver_2d::optimize_on_plane;

#[derive(Debug)]
pub(crate) enum OptimizationResult {
    Feasible {
        optimal_velocity: Vec3,
    },
    Infeasible {
        failed_plane: usize,
        last_optimal_velocity: Vec3,
    },
}

/// Finds the velocity inside the ball of `radius` that satisfies all planes
/// and lies closest to `opt_velocity` (or, in direction mode, farthest along
/// it; `opt_velocity` is unit length in that case).
///
/// Planes are enforced incrementally in the order given. On infeasibility
/// the failing plane index is reported together with the best velocity for
/// the planes before it.
pub(crate) fn incremental_optimization(
    planes: &[Plane],
    radius: f32,
    opt_velocity: Vec3,
    direction_opt: bool,
) -> OptimizationResult {
    let mut result = if direction_opt {
        opt_velocity * radius
    } else if opt_velocity.length_squared() > radius * radius {
        opt_velocity.normalize() * radius
    } else {
        opt_velocity
    };

    for (i, plane) in planes.iter().enumerate() {
        if plane.signed_distance(result) < 0.0 {
            // The current result violates this plane; recompute on it,
            // consistent with all earlier planes.
            match optimize_on_plane(planes, i, radius, opt_velocity, direction_opt) {
                Some(new_result) => result = new_result,
                None => {
                    return OptimizationResult::Infeasible {
                        failed_plane: i,
                        last_optimal_velocity: result,
                    }
                }
            }
        }
    }

    OptimizationResult::Feasible {
        optimal_velocity: result,
    }
}
