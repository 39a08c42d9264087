//! Force-directed node placement (Fruchterman-Reingold)
//!
//! Nodes closer than `2k` repel with force `k²/d`, every edge attracts its ends with force
//! `d²/k`, so two linked nodes settle at the ideal distance `k`. Moves are capped by a
//! temperature which cools linearly to zero over the iterations.
//!
//! Repulsion is only computed between nodes in neighbouring cells of a grid with cell size
//! `2k`, which keeps an iteration close to linear in the number of nodes.
use std::collections::HashMap;

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Distances are clamped to this value to keep the forces finite
const MIN_DISTANCE: f64 = 1e-3;
/// Repulsion cutoff, as a multiple of the ideal distance
const REPULSION_RANGE: f64 = 2.;

#[derive(Clone, Debug)]
pub struct LayoutSettings {
    /// Ideal distance between linked nodes
    pub ideal_distance: f64,
    pub iterations: usize,
    /// Seed of the random starting positions
    pub seed: u64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            ideal_distance: 350.,
            iterations: 500,
            seed: 0,
        }
    }
}

/// Undirected graph of numbered nodes
#[derive(Clone, Debug, Default)]
pub struct LayoutGraph {
    node_count: usize,
    edges: Vec<(usize, usize)>,
}

impl LayoutGraph {
    /// Add a node, returning its index
    pub fn add_node(&mut self) -> usize {
        self.node_count += 1;
        self.node_count - 1
    }

    pub fn add_edge(&mut self, a: usize, b: usize) {
        debug_assert!(a < self.node_count && b < self.node_count);
        self.edges.push((a, b));
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }
}

/// Compute a position for every node of `graph`, indexed like the nodes
pub fn fruchterman_reingold(graph: &LayoutGraph, settings: &LayoutSettings) -> Vec<Vector2<f64>> {
    let n = graph.node_count();
    if n == 0 {
        return Vec::new();
    }
    let k = settings.ideal_distance;
    let side = k * (n as f64).sqrt();
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let mut positions: Vec<Vector2<f64>> = (0..n)
        .map(|_| Vector2::new(rng.random::<f64>() * side, rng.random::<f64>() * side))
        .collect();

    let initial_temperature = side / 10.;
    let iterations = settings.iterations.max(1);
    for iteration in 0..iterations {
        let temperature = initial_temperature * (1. - iteration as f64 / iterations as f64);
        let mut displacement = repulsion(&positions, k);

        for &(a, b) in graph.edges() {
            if a == b {
                continue;
            }
            let delta = positions[a] - positions[b];
            let distance = delta.norm().max(MIN_DISTANCE);
            let pull = delta * (distance / k);
            displacement[a] -= pull;
            displacement[b] += pull;
        }

        for (position, shift) in positions.iter_mut().zip(&displacement) {
            let length = shift.norm();
            if length > 0. {
                *position += shift * (length.min(temperature) / length);
            }
        }
    }
    positions
}

/// Repulsive displacement of every node from the nodes within the cutoff
fn repulsion(positions: &[Vector2<f64>], k: f64) -> Vec<Vector2<f64>> {
    let range = REPULSION_RANGE * k;
    let cell_of = |p: &Vector2<f64>| ((p.x / range).floor() as i64, (p.y / range).floor() as i64);
    let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in positions.iter().enumerate() {
        grid.entry(cell_of(p)).or_default().push(i);
    }

    let mut displacement = vec![Vector2::<f64>::zeros(); positions.len()];
    for (i, p) in positions.iter().enumerate() {
        let (cx, cy) = cell_of(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let Some(cell) = grid.get(&(cx + dx, cy + dy)) else {
                    continue;
                };
                // Each pair is seen from both ends, only the lower index applies it
                for &j in cell.iter().filter(|&&j| j > i) {
                    let delta = positions[i] - positions[j];
                    let distance = delta.norm();
                    if distance >= range {
                        continue;
                    }
                    let distance = distance.max(MIN_DISTANCE);
                    let push = delta * (k * k / (distance * distance));
                    displacement[i] += push;
                    displacement[j] -= push;
                }
            }
        }
    }
    displacement
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LayoutSettings {
        LayoutSettings {
            ideal_distance: 100.,
            iterations: 300,
            seed: 7,
        }
    }

    #[test]
    fn repulsion_is_cut_off() {
        let near = repulsion(&[Vector2::new(0., 0.), Vector2::new(10., 0.)], 10.);
        // k²/d = 10 away from each other
        assert!((near[0].x + 10.).abs() < 1e-9);
        assert!((near[1].x - 10.).abs() < 1e-9);

        let far = repulsion(&[Vector2::new(0., 0.), Vector2::new(25., 0.)], 10.);
        assert_eq!(far, vec![Vector2::zeros(), Vector2::zeros()]);
    }

    #[test]
    fn grid_matches_all_pairs_within_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let positions: Vec<Vector2<f64>> = (0..60)
            .map(|_| Vector2::new(rng.random::<f64>() * 200. - 100., rng.random::<f64>() * 200. - 100.))
            .collect();
        let k = 15.;
        let mut expected = vec![Vector2::<f64>::zeros(); positions.len()];
        for i in 0..positions.len() {
            for j in 0..positions.len() {
                let delta = positions[i] - positions[j];
                let distance = delta.norm();
                if i != j && distance < REPULSION_RANGE * k {
                    expected[i] += delta * (k * k / (distance * distance));
                }
            }
        }
        for (got, want) in repulsion(&positions, k).iter().zip(&expected) {
            assert!((got - want).norm() < 1e-6, "{} != {}", got, want);
        }
    }

    #[test]
    fn empty_graph() {
        assert!(fruchterman_reingold(&LayoutGraph::default(), &settings()).is_empty());
    }

    #[test]
    fn linked_pair_settles_at_ideal_distance() {
        let mut graph = LayoutGraph::default();
        let a = graph.add_node();
        let b = graph.add_node();
        graph.add_edge(a, b);
        let positions = fruchterman_reingold(&graph, &settings());
        let distance = (positions[a] - positions[b]).norm();
        assert!((distance - 100.).abs() < 5., "distance was {}", distance);
    }

    #[test]
    fn deterministic_for_a_seed() {
        let mut graph = LayoutGraph::default();
        let hub = graph.add_node();
        for _ in 0..6 {
            let leaf = graph.add_node();
            graph.add_edge(hub, leaf);
        }
        let first = fruchterman_reingold(&graph, &settings());
        let second = fruchterman_reingold(&graph, &settings());
        assert_eq!(first, second);
        assert!(first.iter().all(|p| p.x.is_finite() && p.y.is_finite()));

        // Leaves end up closer to their hub than to the far side of the star
        let max_spoke = (1..7)
            .map(|leaf| (first[leaf] - first[hub]).norm())
            .fold(0., f64::max);
        let max_span = (1..7)
            .flat_map(|i| (1..7).map(move |j| (i, j)))
            .map(|(i, j)| (first[i] - first[j]).norm())
            .fold(0., f64::max);
        assert!(max_spoke < max_span);
    }
}
