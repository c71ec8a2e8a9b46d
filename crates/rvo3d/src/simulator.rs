use std::collections::{HashMap, HashSet};
use std::mem;

use bevy_math::Vec3;

use geometry::Plane;

use crate::agent::Agent;
use crate::kd_tree::KdTree;

/// Stable agent identifier, assigned monotonically and never reused.
pub type AgentId = usize;

/// Per-agent parameters, used both as simulator-wide defaults and for
/// explicit agent construction.
#[derive(Clone, Copy, Debug)]
pub struct AgentParams {
    pub neighbor_dist: f32,
    pub max_neighbors: usize,
    pub time_horizon: f32,
    pub radius: f32,
    pub max_speed: f32,
    pub avoidance_group: u32,
    pub groups_to_avoid: u32,
    pub groups_to_ignore: u32,
    pub velocity: Vec3,
}

/// Owns the agent population and drives the simulation.
///
/// Agents live in dense storage reshuffled on removal; the id map is the
/// stable external address. All per-agent accessors panic on an unknown id.
#[derive(Debug, Default)]
pub struct Simulator {
    agents: Vec<Agent>,
    agent_ids: HashMap<AgentId, usize>,
    kd_tree: KdTree,
    defaults: Option<AgentParams>,
    time_step: f32,
    global_time: f32,
    next_id: AgentId,
}

impl Simulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a simulator with the time step and agent defaults already set.
    #[must_use]
    pub fn with_defaults(time_step: f32, defaults: AgentParams) -> Self {
        Self {
            time_step,
            defaults: Some(defaults),
            ..Self::default()
        }
    }

    pub fn set_agent_defaults(&mut self, defaults: AgentParams) {
        self.defaults = Some(defaults);
    }

    /// Adds an agent with the configured defaults. Returns `None` when no
    /// defaults have been set.
    pub fn add_agent(&mut self, position: Vec3) -> Option<AgentId> {
        let defaults = self.defaults?;

        Some(self.add_agent_with_params(position, &defaults))
    }

    pub fn add_agent_with_params(&mut self, position: Vec3, params: &AgentParams) -> AgentId {
        let id = self.next_id;
        self.next_id += 1;

        self.agent_ids.insert(id, self.agents.len());
        self.agents.push(Agent::new(id, position, params));

        id
    }

    /// Removes an agent. The last agent takes its slot in the dense storage;
    /// all ids other than the removed one stay addressable.
    pub fn remove_agent(&mut self, id: AgentId) {
        let index = self.index_of(id);
        self.agent_ids.remove(&id);

        self.agents.swap_remove(index);

        if index < self.agents.len() {
            self.agent_ids.insert(self.agents[index].id, index);
        }
    }

    #[must_use]
    pub fn has_agent(&self, id: AgentId) -> bool {
        self.agent_ids.contains_key(&id)
    }

    /// Advances the simulation by one time step.
    ///
    /// The k-d tree is rebuilt, every agent picks its new velocity against a
    /// consistent snapshot of all the others, and only then do velocities
    /// and positions move.
    pub fn do_step(&mut self) {
        self.kd_tree.build(&self.agents);

        for i in 0..self.agents.len() {
            // The scratch lists are taken out so the agent's read-only work
            // can borrow the whole population; the allocations survive.
            let mut neighbors = mem::take(&mut self.agents[i].neighbors);
            let mut orca_planes = mem::take(&mut self.agents[i].orca_planes);

            let (new_velocity, valid) = {
                let agent = &self.agents[i];
                agent.compute_neighbors(&self.kd_tree, &self.agents, &mut neighbors);
                agent.compute_new_velocity(
                    &self.agents,
                    &neighbors,
                    self.time_step,
                    &mut orca_planes,
                )
            };

            let agent = &mut self.agents[i];
            agent.neighbors = neighbors;
            agent.orca_planes = orca_planes;
            agent.new_velocity = new_velocity;
            agent.valid = valid;
        }

        let time_step = self.time_step;

        for agent in &mut self.agents {
            agent.update(time_step);
        }

        self.global_time += time_step;
    }

    pub fn set_time_step(&mut self, time_step: f32) {
        self.time_step = time_step;
    }

    #[must_use]
    pub fn time_step(&self) -> f32 {
        self.time_step
    }

    #[must_use]
    pub fn global_time(&self) -> f32 {
        self.global_time
    }

    #[must_use]
    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn agent_position(&self, id: AgentId) -> Vec3 {
        self.agent(id).position
    }

    pub fn set_agent_position(&mut self, id: AgentId, position: Vec3) {
        self.agent_mut(id).position = position;
    }

    #[must_use]
    pub fn agent_velocity(&self, id: AgentId) -> Vec3 {
        self.agent(id).velocity
    }

    pub fn set_agent_velocity(&mut self, id: AgentId, velocity: Vec3) {
        self.agent_mut(id).velocity = velocity;
    }

    #[must_use]
    pub fn agent_pref_velocity(&self, id: AgentId) -> Vec3 {
        self.agent(id).pref_velocity
    }

    pub fn set_agent_pref_velocity(&mut self, id: AgentId, pref_velocity: Vec3) {
        self.agent_mut(id).pref_velocity = pref_velocity;
    }

    #[must_use]
    pub fn agent_radius(&self, id: AgentId) -> f32 {
        self.agent(id).radius
    }

    pub fn set_agent_radius(&mut self, id: AgentId, radius: f32) {
        self.agent_mut(id).radius = radius;
    }

    #[must_use]
    pub fn agent_max_speed(&self, id: AgentId) -> f32 {
        self.agent(id).max_speed
    }

    pub fn set_agent_max_speed(&mut self, id: AgentId, max_speed: f32) {
        self.agent_mut(id).max_speed = max_speed;
    }

    #[must_use]
    pub fn agent_neighbor_dist(&self, id: AgentId) -> f32 {
        self.agent(id).neighbor_dist
    }

    pub fn set_agent_neighbor_dist(&mut self, id: AgentId, neighbor_dist: f32) {
        self.agent_mut(id).neighbor_dist = neighbor_dist;
    }

    #[must_use]
    pub fn agent_time_horizon(&self, id: AgentId) -> f32 {
        self.agent(id).time_horizon
    }

    pub fn set_agent_time_horizon(&mut self, id: AgentId, time_horizon: f32) {
        self.agent_mut(id).time_horizon = time_horizon;
    }

    #[must_use]
    pub fn agent_max_neighbors(&self, id: AgentId) -> usize {
        self.agent(id).max_neighbors
    }

    pub fn set_agent_max_neighbors(&mut self, id: AgentId, max_neighbors: usize) {
        self.agent_mut(id).max_neighbors = max_neighbors;
    }

    #[must_use]
    pub fn agent_avoidance_group(&self, id: AgentId) -> u32 {
        self.agent(id).avoidance_group
    }

    pub fn set_agent_avoidance_group(&mut self, id: AgentId, mask: u32) {
        self.agent_mut(id).avoidance_group = mask;
    }

    #[must_use]
    pub fn agent_groups_to_avoid(&self, id: AgentId) -> u32 {
        self.agent(id).groups_to_avoid
    }

    pub fn set_agent_groups_to_avoid(&mut self, id: AgentId, mask: u32) {
        self.agent_mut(id).groups_to_avoid = mask;
    }

    #[must_use]
    pub fn agent_groups_to_ignore(&self, id: AgentId) -> u32 {
        self.agent(id).groups_to_ignore
    }

    pub fn set_agent_groups_to_ignore(&mut self, id: AgentId, mask: u32) {
        self.agent_mut(id).groups_to_ignore = mask;
    }

    pub fn add_agent_neighbor_to_ignore(&mut self, id: AgentId, other: AgentId) {
        self.agent_mut(id).ignored_agents.insert(other);
    }

    pub fn remove_agent_neighbor_to_ignore(&mut self, id: AgentId, other: AgentId) {
        self.agent_mut(id).ignored_agents.remove(&other);
    }

    pub fn set_agent_ignored_neighbors(&mut self, id: AgentId, ignored: HashSet<AgentId>) {
        self.agent_mut(id).ignored_agents = ignored;
    }

    /// Clears the ignore set, keeping its capacity.
    pub fn clear_agent_ignored_neighbors(&mut self, id: AgentId) {
        self.agent_mut(id).ignored_agents.clear();
    }

    /// Number of neighbours found for the agent in the last step.
    #[must_use]
    pub fn agent_num_neighbors(&self, id: AgentId) -> usize {
        self.agent(id).neighbors.len()
    }

    /// Id of the agent's `neighbor_no`-th nearest neighbour from the last
    /// step.
    #[must_use]
    pub fn agent_neighbor(&self, id: AgentId, neighbor_no: usize) -> AgentId {
        self.agents[self.agent(id).neighbors[neighbor_no].1].id
    }

    /// Number of avoidance planes built for the agent in the last step.
    #[must_use]
    pub fn agent_num_orca_planes(&self, id: AgentId) -> usize {
        self.agent(id).orca_planes.len()
    }

    /// The agent's `plane_no`-th avoidance plane from the last step, in
    /// neighbour order.
    #[must_use]
    pub fn agent_orca_plane(&self, id: AgentId, plane_no: usize) -> Plane {
        self.agent(id).orca_planes[plane_no]
    }

    /// False when the last step ran into a numerical degeneracy for this
    /// agent.
    #[must_use]
    pub fn is_agent_valid(&self, id: AgentId) -> bool {
        self.agent(id).valid
    }

    fn index_of(&self, id: AgentId) -> usize {
        *self
            .agent_ids
            .get(&id)
            .expect("no agent with the given id")
    }

    fn agent(&self, id: AgentId) -> &Agent {
        &self.agents[self.index_of(id)]
    }

    fn agent_mut(&mut self, id: AgentId) -> &mut Agent {
        let index = self.index_of(id);
        &mut self.agents[index]
    }
}
