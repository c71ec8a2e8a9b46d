use geometry::Aabb;

use crate::agent::Agent;

pub(crate) const MAX_LEAF_SIZE: usize = 10;

#[derive(Clone, Debug, Default)]
struct KdTreeNode {
    begin: usize,
    end: usize,
    left: usize,
    right: usize,
    bounds: Aabb,
}

/// A balanced k-d tree over agent positions, rebuilt from scratch each step.
///
/// The tree holds its own vector of indices into the simulator's agent
/// storage and reorders that vector in place during the build; the
/// simulator's ordering is never touched.
#[derive(Debug, Default)]
pub(crate) struct KdTree {
    indices: Vec<usize>,
    nodes: Vec<KdTreeNode>,
}

impl KdTree {
    pub(crate) fn build(&mut self, agents: &[Agent]) {
        self.indices.clear();
        self.indices.extend(0..agents.len());

        if !agents.is_empty() {
            self.nodes.clear();
            self.nodes
                .resize(2 * agents.len() - 1, KdTreeNode::default());
            self.build_recursive(0, agents.len(), 0, agents);
        }
    }

    fn build_recursive(&mut self, begin: usize, end: usize, node: usize, agents: &[Agent]) {
        let mut bounds = Aabb::from_point(agents[self.indices[begin]].position);

        for i in begin + 1..end {
            bounds.expand(agents[self.indices[i]].position);
        }

        self.nodes[node] = KdTreeNode {
            begin,
            end,
            left: 0,
            right: 0,
            bounds,
        };

        if end - begin > MAX_LEAF_SIZE {
            // Split at the midpoint of the longest axis.
            let size = bounds.size();
            let axis = if size.x > size.y && size.x > size.z {
                0
            } else if size.y > size.z {
                1
            } else {
                2
            };
            let split_value = 0.5 * (bounds.max[axis] + bounds.min[axis]);

            let mut left = begin;
            let mut right = end;

            while left < right {
                while left < right && agents[self.indices[left]].position[axis] < split_value {
                    left += 1;
                }

                while right > left && agents[self.indices[right - 1]].position[axis] >= split_value
                {
                    right -= 1;
                }

                if left < right {
                    self.indices.swap(left, right - 1);
                    left += 1;
                    right -= 1;
                }
            }

            let mut left_size = left - begin;

            if left_size == 0 {
                // Every agent landed on one side; force one over so the
                // recursion terminates.
                left_size += 1;
                left += 1;
            }

            let left_node = node + 1;
            let right_node = node + 2 * left_size;
            self.nodes[node].left = left_node;
            self.nodes[node].right = right_node;

            self.build_recursive(begin, left, left_node, agents);
            self.build_recursive(left, end, right_node, agents);
        }
    }

    /// Collects up to `agent.max_neighbors` qualifying agents within
    /// `range_sq` of `agent`, nearer subtree first. The range shrinks as the
    /// neighbour list fills, pruning the rest of the descent.
    pub(crate) fn compute_agent_neighbors(
        &self,
        agent: &Agent,
        agents: &[Agent],
        mut range_sq: f32,
        neighbors: &mut Vec<(f32, usize)>,
    ) {
        if !self.indices.is_empty() {
            self.query_recursive(agent, agents, &mut range_sq, 0, neighbors);
        }
    }

    fn query_recursive(
        &self,
        agent: &Agent,
        agents: &[Agent],
        range_sq: &mut f32,
        node: usize,
        neighbors: &mut Vec<(f32, usize)>,
    ) {
        let tree_node = &self.nodes[node];

        if tree_node.end - tree_node.begin <= MAX_LEAF_SIZE {
            for i in tree_node.begin..tree_node.end {
                let other_index = self.indices[i];
                agent.insert_agent_neighbor(&agents[other_index], other_index, neighbors, range_sq);
            }
        } else {
            let dist_sq_left = self.nodes[tree_node.left]
                .bounds
                .distance_squared(agent.position);
            let dist_sq_right = self.nodes[tree_node.right]
                .bounds
                .distance_squared(agent.position);

            if dist_sq_left < dist_sq_right {
                if dist_sq_left < *range_sq {
                    self.query_recursive(agent, agents, range_sq, tree_node.left, neighbors);

                    if dist_sq_right < *range_sq {
                        self.query_recursive(agent, agents, range_sq, tree_node.right, neighbors);
                    }
                }
            } else if dist_sq_right < *range_sq {
                self.query_recursive(agent, agents, range_sq, tree_node.right, neighbors);

                if dist_sq_left < *range_sq {
                    self.query_recursive(agent, agents, range_sq, tree_node.left, neighbors);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::AgentParams;
    use bevy_math::Vec3;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn params(max_neighbors: usize, neighbor_dist: f32) -> AgentParams {
        AgentParams {
            neighbor_dist,
            max_neighbors,
            time_horizon: 2.0,
            radius: 0.5,
            max_speed: 1.0,
            avoidance_group: 1,
            groups_to_avoid: u32::MAX,
            groups_to_ignore: 0,
            velocity: Vec3::ZERO,
        }
    }

    fn random_cloud(count: usize, seed: u64) -> Vec<Agent> {
        let mut rng = StdRng::seed_from_u64(seed);

        (0..count)
            .map(|id| {
                let position = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                );
                Agent::new(id, position, &params(5, 8.0))
            })
            .collect()
    }

    fn brute_force_neighbors(agents: &[Agent], index: usize) -> Vec<(f32, usize)> {
        let agent = &agents[index];
        let mut all: Vec<(f32, usize)> = agents
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != index)
            .map(|(i, other)| ((agent.position - other.position).length_squared(), i))
            .filter(|&(dist_sq, _)| dist_sq < agent.neighbor_dist * agent.neighbor_dist)
            .collect();

        all.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        all.truncate(agent.max_neighbors);
        all
    }

    #[test]
    fn test_query_matches_brute_force() {
        let agents = random_cloud(60, 7);

        let mut tree = KdTree::default();
        tree.build(&agents);

        for index in 0..agents.len() {
            let agent = &agents[index];
            let mut neighbors = Vec::new();

            tree.compute_agent_neighbors(
                agent,
                &agents,
                agent.neighbor_dist * agent.neighbor_dist,
                &mut neighbors,
            );

            assert_eq!(neighbors, brute_force_neighbors(&agents, index));
        }
    }

    #[test]
    fn test_neighbors_sorted_and_capped() {
        let agents = random_cloud(40, 11);

        let mut tree = KdTree::default();
        tree.build(&agents);

        for agent in &agents {
            let mut neighbors = Vec::new();

            tree.compute_agent_neighbors(
                agent,
                &agents,
                agent.neighbor_dist * agent.neighbor_dist,
                &mut neighbors,
            );

            assert!(neighbors.len() <= agent.max_neighbors);
            assert!(neighbors.windows(2).all(|pair| pair[0].0 <= pair[1].0));
        }
    }

    #[test]
    fn test_rebuild_after_population_change() {
        let mut agents = random_cloud(30, 3);

        let mut tree = KdTree::default();
        tree.build(&agents);

        agents.truncate(12);
        tree.build(&agents);

        let agent = &agents[0];
        let mut neighbors = Vec::new();

        tree.compute_agent_neighbors(
            agent,
            &agents,
            agent.neighbor_dist * agent.neighbor_dist,
            &mut neighbors,
        );

        assert_eq!(neighbors, brute_force_neighbors(&agents, 0));
    }
}
