use bevy_math::Vec3;

use geometry::Plane;

use crate::Agent;

/// The pairwise frame in which one neighbour constrains an agent's velocity.
#[derive(Clone, Debug)]
pub struct VelocityObstacle {
    pub relative_position: Vec3,
    pub relative_velocity: Vec3,
    pub combined_radius: f32,
    pub time_horizon: f32,
    pub agent_velocity: Vec3,
}

impl VelocityObstacle {
    #[must_use]
    pub fn new(agent: &Agent, other: &Agent, time_horizon: f32) -> Self {
        Self {
            relative_position: other.position - agent.position,
            relative_velocity: agent.velocity - other.velocity,
            combined_radius: agent.radius + other.radius,
            time_horizon,
            agent_velocity: agent.velocity,
        }
    }

    /// Builds the avoidance half-space for this pair.
    ///
    /// The permitted side holds the velocities that keep the pair apart for
    /// the time horizon, assuming the neighbour contributes its half of the
    /// avoidance. For pairs already in collision the horizon is replaced by
    /// the single `time_step`. Degenerate geometry flows through the
    /// division and surfaces as a NaN normal; callers are expected to test
    /// for it.
    #[must_use]
    pub fn orca_plane(&self, time_step: f32) -> Plane {
        let inv_time_horizon = 1.0 / self.time_horizon;
        let dist_sq = self.relative_position.length_squared();
        let combined_radius_sq = self.combined_radius * self.combined_radius;

        let (u, normal) = if dist_sq > combined_radius_sq {
            // No collision yet. Vector from the cutoff center to the
            // relative velocity decides which boundary is closest.
            let w = self.relative_velocity - inv_time_horizon * self.relative_position;
            let w_length_sq = w.length_squared();

            let dot_product = w.dot(self.relative_position);

            if dot_product < 0.0 && dot_product * dot_product > combined_radius_sq * w_length_sq {
                // Project on the cut-off sphere.
                let w_length = w_length_sq.sqrt();
                let unit_w = w / w_length;

                (
                    (self.combined_radius * inv_time_horizon - w_length) * unit_w,
                    unit_w,
                )
            } else {
                // Project on the side of the cone.
                let a = dist_sq;
                let b = self.relative_position.dot(self.relative_velocity);
                let c = self.relative_velocity.length_squared()
                    - self
                        .relative_position
                        .cross(self.relative_velocity)
                        .length_squared()
                        / (dist_sq - combined_radius_sq);
                let t = (b + (b * b - a * c).sqrt()) / a;
                let cw = self.relative_velocity - t * self.relative_position;
                let cw_length = cw.length();
                let unit_w = cw / cw_length;

                ((self.combined_radius * t - cw_length) * unit_w, unit_w)
            }
        } else {
            // Already in collision; resolve within a single time step.
            let inv_time_step = 1.0 / time_step;
            let w = self.relative_velocity - inv_time_step * self.relative_position;
            let w_length = w.length();
            let unit_w = w / w_length;

            (
                (self.combined_radius * inv_time_step - w_length) * unit_w,
                unit_w,
            )
        };

        Plane::new(self.agent_velocity + 0.5 * u, normal)
    }
}
