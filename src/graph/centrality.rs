use super::Graph;
use crate::stat::rescale;
use bit_set::BitSet;
use rayon::prelude::*;
use std::{cmp::Ordering, collections::BinaryHeap};

impl Graph {
    /// Sum of incident edge weights, or the number of incident edges.
    pub fn degree(&self, weighted: bool) -> Vec<f64> {
        (0..self.num_nodes())
            .map(|v| {
                self.incident(v)
                    .map(|e| if weighted { e.weight } else { 1. })
                    .sum()
            })
            .collect()
    }

    pub fn degree_centrality(&self, weighted: bool) -> Vec<f64> {
        rescale(&self.degree(weighted))
    }

    /// Weighted betweenness using edge weights as distances (Brandes, 2001).
    ///
    /// Not halved for undirected graphs; every ordered source/target pair counts.
    pub fn betweenness(&self) -> Vec<f64> {
        let n = self.num_nodes();
        let partials: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|s| self.single_source_dependency(s))
            .collect();

        // summed in source order so the result does not depend on scheduling
        let mut ans = vec![0.; n];
        for partial in partials {
            for (acc, d) in ans.iter_mut().zip(partial) {
                *acc += d;
            }
        }
        ans
    }

    pub fn betweenness_centrality(&self) -> Vec<f64> {
        rescale(&self.betweenness())
    }

    /// Weight connecting each node outside `subset` to the nodes in `subset`.
    pub fn sub_degree(&self, subset: &BitSet) -> Vec<f64> {
        let mut ans = vec![0.; self.num_nodes()];
        for e in self.edges() {
            match (subset.contains(e.a), subset.contains(e.b)) {
                (true, false) => ans[e.b] += e.weight,
                (false, true) => ans[e.a] += e.weight,
                _ => {}
            }
        }
        ans
    }

    pub fn sub_degree_centrality(&self, subset: &BitSet) -> Vec<f64> {
        rescale(&self.sub_degree(subset))
    }

    /// Dijkstra pass from `source` counting shortest paths, followed by the
    /// dependency accumulation in reverse settle order.
    fn single_source_dependency(&self, source: usize) -> Vec<f64> {
        let n = self.num_nodes();
        let mut settled: Vec<Option<f64>> = vec![None; n];
        let mut seen: Vec<Option<f64>> = vec![None; n];
        let mut sigma = vec![0.; n];
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut order = Vec::with_capacity(n);

        sigma[source] = 1.;
        seen[source] = Some(0.);
        let mut seq = 0;
        let mut queue = BinaryHeap::new();
        queue.push(QueueItem {
            dist: 0.,
            seq,
            pred: source,
            node: source,
        });

        while let Some(QueueItem {
            dist, pred, node: v, ..
        }) = queue.pop()
        {
            if settled[v].is_some() {
                continue;
            }
            if v != source {
                sigma[v] += sigma[pred];
            }
            settled[v] = Some(dist);
            order.push(v);

            for (w, weight) in self.neighbors(v) {
                if settled[w].is_some() {
                    continue;
                }
                let vw_dist = dist + weight;
                match seen[w] {
                    Some(d) if vw_dist == d => {
                        sigma[w] += sigma[v];
                        preds[w].push(v);
                    }
                    Some(d) if vw_dist > d => {}
                    _ => {
                        seen[w] = Some(vw_dist);
                        seq += 1;
                        queue.push(QueueItem {
                            dist: vw_dist,
                            seq,
                            pred: v,
                            node: w,
                        });
                        sigma[w] = 0.;
                        preds[w].clear();
                        preds[w].push(v);
                    }
                }
            }
        }

        let mut delta = vec![0.; n];
        let mut ans = vec![0.; n];
        while let Some(w) = order.pop() {
            let coeff = (1. + delta[w]) / sigma[w];
            for &v in &preds[w] {
                delta[v] += sigma[v] * coeff;
            }
            if w != source {
                ans[w] += delta[w];
            }
        }
        ans
    }
}

/// Min-heap entry ordered by distance, then by insertion order.
#[derive(Debug, Clone, Copy)]
struct QueueItem {
    dist: f64,
    seq: usize,
    pred: usize,
    node: usize,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::assert_f64_eq;

    fn graph(n: usize, edges: &[(usize, usize, f64)]) -> Graph {
        let mut g = Graph::new(n);
        for &(a, b, w) in edges {
            g.add_edge(a, b, w);
        }
        g
    }

    fn assert_vec_eq(expect: &[f64], actual: &[f64]) {
        assert_eq!(expect.len(), actual.len());
        for (e, a) in expect.iter().zip(actual) {
            assert_f64_eq(*e, *a);
        }
    }

    #[test]
    fn test_degree() {
        let g = graph(4, &[(0, 1, 2.), (0, 2, 2.), (1, 2, 1.)]);
        assert_vec_eq(&[4., 3., 3., 0.], &g.degree(true));
        assert_vec_eq(&[2., 2., 2., 0.], &g.degree(false));
        assert_vec_eq(&[1., 0.75, 0.75, 0.], &g.degree_centrality(true));

        let flat = graph(3, &[(0, 1, 1.), (1, 2, 1.), (0, 2, 1.)]);
        assert_vec_eq(&[0., 0., 0.], &flat.degree_centrality(true));
    }

    #[test]
    fn test_betweenness_path_and_star() {
        let path = graph(3, &[(0, 1, 1.), (1, 2, 1.)]);
        assert_vec_eq(&[0., 2., 0.], &path.betweenness());
        assert_vec_eq(&[0., 1., 0.], &path.betweenness_centrality());

        let star = graph(4, &[(0, 1, 1.), (0, 2, 1.), (0, 3, 1.)]);
        assert_vec_eq(&[6., 0., 0., 0.], &star.betweenness());
    }

    #[test]
    fn test_betweenness_ties() {
        // two equally short routes between opposite corners of a square
        let square = graph(4, &[(0, 1, 1.), (1, 3, 1.), (0, 2, 1.), (2, 3, 1.)]);
        assert_vec_eq(&[1., 1., 1., 1.], &square.betweenness());
        assert_vec_eq(&[0., 0., 0., 0.], &square.betweenness_centrality());

        // the shortcut 0 - 3 ties with both two-hop routes
        let kite = graph(
            4,
            &[(0, 1, 1.), (1, 3, 1.), (0, 2, 1.), (2, 3, 1.), (0, 3, 2.)],
        );
        let bc = kite.betweenness();
        assert_f64_eq(2. / 3., bc[1]);
        assert_f64_eq(2. / 3., bc[2]);
    }

    #[test]
    fn test_betweenness_weighted() {
        let g = graph(3, &[(0, 1, 1.), (1, 2, 1.), (0, 2, 5.)]);
        assert_vec_eq(&[0., 2., 0.], &g.betweenness());

        let cheap = graph(3, &[(0, 1, 1.), (1, 2, 1.), (0, 2, 1.)]);
        assert_vec_eq(&[0., 0., 0.], &cheap.betweenness());
    }

    #[test]
    fn test_betweenness_is_deterministic() {
        let g = graph(
            6,
            &[
                (0, 1, 1.),
                (1, 2, 2.),
                (2, 3, 1.),
                (3, 4, 3.),
                (4, 5, 1.),
                (0, 5, 2.),
                (1, 4, 2.),
            ],
        );
        let first = g.betweenness();
        for _ in 0..4 {
            assert_eq!(first, g.betweenness());
        }
    }

    #[test]
    fn test_sub_degree() {
        let g = graph(4, &[(0, 1, 2.), (0, 2, 2.), (1, 2, 1.)]);
        let subset = BitSet::from_iter([0]);
        assert_vec_eq(&[0., 2., 2., 0.], &g.sub_degree(&subset));
        assert_vec_eq(&[0., 1., 1., 0.], &g.sub_degree_centrality(&subset));

        let subset = BitSet::from_iter([0, 1]);
        assert_vec_eq(&[0., 0., 3., 0.], &g.sub_degree(&subset));
        assert_vec_eq(&[0.; 4], &g.sub_degree(&BitSet::new()));
    }
}
