use std::collections::HashSet;

use bevy_math::Vec3;

use geometry::Plane;

use crate::kd_tree::KdTree;
use crate::optimize_velocity;
use crate::simulator::{AgentId, AgentParams};
use crate::velocity_obstacle::VelocityObstacle;

/// A single spherical agent.
///
/// All mutation goes through the [`Simulator`](crate::Simulator); the scratch
/// lists (`neighbors`, `orca_planes`) keep their allocations across steps.
#[derive(Clone, Debug)]
pub struct Agent {
    pub(crate) id: AgentId,
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) pref_velocity: Vec3,
    pub(crate) new_velocity: Vec3,
    pub(crate) radius: f32,
    pub(crate) max_speed: f32,
    pub(crate) neighbor_dist: f32,
    pub(crate) time_horizon: f32,
    pub(crate) max_neighbors: usize,
    pub(crate) avoidance_group: u32,
    pub(crate) groups_to_avoid: u32,
    pub(crate) groups_to_ignore: u32,
    pub(crate) ignored_agents: HashSet<AgentId>,
    pub(crate) neighbors: Vec<(f32, usize)>,
    pub(crate) orca_planes: Vec<Plane>,
    pub(crate) valid: bool,
}

impl Agent {
    pub(crate) fn new(id: AgentId, position: Vec3, params: &AgentParams) -> Self {
        Self {
            id,
            position,
            velocity: params.velocity,
            pref_velocity: Vec3::ZERO,
            new_velocity: Vec3::ZERO,
            radius: params.radius,
            max_speed: params.max_speed,
            neighbor_dist: params.neighbor_dist,
            time_horizon: params.time_horizon,
            max_neighbors: params.max_neighbors,
            avoidance_group: params.avoidance_group,
            groups_to_avoid: params.groups_to_avoid,
            groups_to_ignore: params.groups_to_ignore,
            ignored_agents: HashSet::new(),
            neighbors: Vec::new(),
            orca_planes: Vec::new(),
            valid: true,
        }
    }

    /// Fills `neighbors` with the nearest qualifying agents, closest first.
    pub(crate) fn compute_neighbors(
        &self,
        kd_tree: &KdTree,
        agents: &[Agent],
        neighbors: &mut Vec<(f32, usize)>,
    ) {
        neighbors.clear();

        if self.max_neighbors > 0 {
            kd_tree.compute_agent_neighbors(
                self,
                agents,
                self.neighbor_dist * self.neighbor_dist,
                neighbors,
            );
        }
    }

    /// Derives one avoidance plane per neighbour, then solves for the
    /// velocity closest to the preferred one. Returns the new velocity and
    /// whether the computation stayed free of numerical degeneracies.
    pub(crate) fn compute_new_velocity(
        &self,
        agents: &[Agent],
        neighbors: &[(f32, usize)],
        time_step: f32,
        orca_planes: &mut Vec<Plane>,
    ) -> (Vec3, bool) {
        orca_planes.clear();
        let mut valid = true;

        for &(_, other_index) in neighbors {
            let obstacle = VelocityObstacle::new(self, &agents[other_index], self.time_horizon);
            let plane = obstacle.orca_plane(time_step);

            if valid && plane.normal.is_nan() {
                valid = false;
            }

            orca_planes.push(plane);
        }

        (
            optimize_velocity(self.pref_velocity, self.max_speed, orca_planes),
            valid,
        )
    }

    /// Adds `other` to the neighbour list if it qualifies, keeping the list
    /// sorted ascending by squared distance and capped at `max_neighbors`.
    /// Once the list is full, `range_sq` shrinks to the worst kept entry so
    /// the remaining tree descent narrows.
    pub(crate) fn insert_agent_neighbor(
        &self,
        other: &Agent,
        other_index: usize,
        neighbors: &mut Vec<(f32, usize)>,
        range_sq: &mut f32,
    ) {
        if self.id == other.id {
            return;
        }

        if self.should_ignore_group(other.avoidance_group)
            || self.ignored_agents.contains(&other.id)
        {
            return;
        }

        let dist_sq = (self.position - other.position).length_squared();

        if dist_sq < *range_sq {
            if neighbors.len() < self.max_neighbors {
                neighbors.push((dist_sq, other_index));
            }

            let mut i = neighbors.len() - 1;

            while i != 0 && dist_sq < neighbors[i - 1].0 {
                neighbors[i] = neighbors[i - 1];
                i -= 1;
            }

            neighbors[i] = (dist_sq, other_index);

            if neighbors.len() == self.max_neighbors {
                *range_sq = neighbors[neighbors.len() - 1].0;
            }
        }
    }

    /// Ignore takes priority over avoid.
    fn should_ignore_group(&self, other_group: u32) -> bool {
        (self.groups_to_avoid & other_group) == 0 || (self.groups_to_ignore & other_group) != 0
    }

    pub(crate) fn update(&mut self, time_step: f32) {
        self.velocity = self.new_velocity;
        self.position += self.velocity * time_step;
    }
}
