#![warn(clippy::pedantic)]

pub(crate) const EPSILON: f32 = 0.00001;

mod agent;
mod kd_tree;
mod simulator;
mod solver_1d;
mod solver_2d;
mod solver_3d;
mod solver_4d;
mod velocity_obstacle;

pub use agent::Agent;
pub use geometry::Plane;
pub use simulator::{AgentId, AgentParams, Simulator};
pub use velocity_obstacle::VelocityObstacle;

use bevy_math::Vec3;
use solver_3d::{incremental_optimization, OptimizationResult};
use solver_4d::relaxed_optimization;

/// Picks the velocity inside the speed ball that satisfies every avoidance
/// plane and lies closest to `pref_velocity`. When the planes admit no such
/// velocity, the constraints are relaxed from the failing plane on and the
/// least-violating velocity is returned instead.
#[must_use]
pub fn optimize_velocity(pref_velocity: Vec3, max_speed: f32, planes: &[Plane]) -> Vec3 {
    match incremental_optimization(planes, max_speed, pref_velocity, false) {
        OptimizationResult::Feasible { optimal_velocity } => optimal_velocity,
        OptimizationResult::Infeasible {
            failed_plane,
            last_optimal_velocity,
        } => relaxed_optimization(planes, failed_plane, max_speed, last_optimal_velocity),
    }
}
