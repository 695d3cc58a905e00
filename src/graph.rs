//! Weighted undirected co-occurrence graph over variables.
//!
//! Nodes are variable indices. Edges live in a flat list and every node keeps
//! the indices of its incident edges, so nothing owns anything else.

mod centrality;
mod dot;

use crate::dataset::Minterm;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub weight: f64,
}

impl Edge {
    /// The endpoint opposite to `node`.
    #[inline]
    pub fn other(&self, node: usize) -> usize {
        if self.a == node {
            self.b
        } else {
            self.a
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    edges: Vec<Edge>,
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); num_nodes],
        }
    }

    /// Add an undirected edge. Endpoints are stored with `a < b`.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        debug_assert!(a != b, "self loops are not supported");
        debug_assert!(
            !self.neighbors(a).any(|(n, _)| n == b),
            "multi edges are not supported"
        );
        let (a, b) = if a < b { (a, b) } else { (b, a) };
        let id = self.edges.len();
        self.edges.push(Edge { a, b, weight });
        self.adjacency[a].push(id);
        self.adjacency[b].push(id);
    }

    /// Build the co-occurrence graph of `rows`, keeping only the edges whose
    /// weight is above the `density` cutoff (see [`density_threshold`]).
    pub fn build(rows: &[Minterm], num_vars: usize, density: f64) -> Self {
        let weights = co_occurrence(rows, num_vars);
        let all: Vec<f64> = weights.iter().map(|&(_, _, w)| w).collect();
        let mut graph = Graph::new(num_vars);
        if let Some(threshold) = density_threshold(&all, density) {
            for (a, b, w) in weights {
                if w > threshold {
                    graph.add_edge(a, b, w);
                }
            }
        }
        graph
    }

    pub fn num_nodes(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn incident(&self, node: usize) -> impl Iterator<Item = &Edge> + '_ {
        self.adjacency[node].iter().map(move |&e| &self.edges[e])
    }

    /// Neighbors of `node` with the connecting edge weight.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.incident(node).map(move |e| (e.other(node), e.weight))
    }

    pub fn max_weight(&self) -> Option<f64> {
        self.edges
            .iter()
            .map(|e| e.weight)
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Turn weights into distances: `1 + max_weight - weight`.
    ///
    /// Strong co-occurrence becomes a short distance.
    pub fn inverted(&self) -> Graph {
        let max = self.max_weight().unwrap_or(0.);
        let mut ans = self.clone();
        for e in ans.edges.iter_mut() {
            e.weight = 1. + max - e.weight;
        }
        ans
    }

    /// Whether every node is reachable from a randomly chosen start node.
    pub fn is_connected(&self) -> bool {
        let n = self.num_nodes();
        if n == 0 {
            return false;
        }
        let root = rand::thread_rng().gen_range(0..n);
        let mut visited = vec![false; n];
        visited[root] = true;
        let mut stack = vec![root];
        let mut count = 1;
        while let Some(v) = stack.pop() {
            for (u, _) in self.neighbors(v) {
                if !visited[u] {
                    visited[u] = true;
                    count += 1;
                    stack.push(u);
                }
            }
        }
        count == n
    }
}

/// Upper-triangle pair weights: for `i < j`, the number of rows where both
/// variables are set.
pub fn co_occurrence(rows: &[Minterm], num_vars: usize) -> Vec<(usize, usize, f64)> {
    let mut counts = vec![0u32; num_vars * num_vars];
    for row in rows {
        for i in (0..num_vars).filter(|&i| row[i]) {
            for j in (i + 1..num_vars).filter(|&j| row[j]) {
                counts[i * num_vars + j] += 1;
            }
        }
    }
    let mut ans = Vec::with_capacity(num_vars * num_vars.saturating_sub(1) / 2);
    for i in 0..num_vars {
        for j in i + 1..num_vars {
            ans.push((i, j, f64::from(counts[i * num_vars + j])));
        }
    }
    ans
}

/// The weight at the `density` position of all pair weights sorted in
/// descending order. Edges must be strictly heavier than it to be kept.
///
/// `density` is clamped into `[0, 1]`. Returns `None` when there are no pairs.
pub fn density_threshold(weights: &[f64], density: f64) -> Option<f64> {
    if weights.is_empty() {
        return None;
    }
    let mut sorted = weights.to_vec();
    sorted.sort_unstable_by(|a, b| b.total_cmp(a));
    let pos = ((sorted.len() - 1) as f64 * density.clamp(0., 1.)).floor() as usize;
    Some(sorted[pos])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::rows;

    #[test]
    fn test_co_occurrence() {
        let rows = rows(&[&[1, 1, 0], &[1, 0, 1], &[1, 1, 1]]);
        assert_eq!(
            vec![(0, 1, 2.), (0, 2, 2.), (1, 2, 1.)],
            co_occurrence(&rows, 3)
        );
    }

    #[test]
    fn test_density() {
        assert_eq!(None, density_threshold(&[], 0.5));
        assert_eq!(Some(2.), density_threshold(&[2., 1., 2.], 0.));
        assert_eq!(Some(2.), density_threshold(&[2., 1., 2.], 0.5));
        assert_eq!(Some(1.), density_threshold(&[2., 1., 2.], 1.));
        assert_eq!(Some(1.), density_threshold(&[2., 1., 2.], 7.));

        let rows = rows(&[&[1, 1, 0], &[1, 0, 1], &[1, 1, 1]]);
        let full = Graph::build(&rows, 3, 1.);
        assert_eq!(
            &[
                Edge {
                    a: 0,
                    b: 1,
                    weight: 2.
                },
                Edge {
                    a: 0,
                    b: 2,
                    weight: 2.
                }
            ],
            full.edges()
        );
        assert!(Graph::build(&rows, 3, 0.5).edges().is_empty());
        assert_eq!(3, Graph::build(&rows, 3, 0.).num_nodes());
    }

    #[test]
    fn test_inverted() {
        let mut g = Graph::new(3);
        g.add_edge(1, 0, 4.);
        g.add_edge(1, 2, 1.);
        let inv = g.inverted();
        assert_eq!(vec![(0, 1.), (2, 4.)], inv.neighbors(1).collect::<Vec<_>>());
        assert_eq!(Some(4.), inv.max_weight());
        assert!(Graph::new(2).inverted().edges().is_empty());
    }

    #[test]
    fn test_is_connected() {
        let mut g = Graph::new(3);
        g.add_edge(0, 1, 1.);
        assert!(!g.is_connected());
        g.add_edge(2, 1, 1.);
        for _ in 0..8 {
            assert!(g.is_connected());
        }
        assert!(!Graph::new(0).is_connected());
        assert!(Graph::new(1).is_connected());
    }
}
