//! Coverage-directed search.
//!
//! Breadth-first walk over sets of still uncovered onset rows. Each state
//! grows every equally ranked implicant, and the rows that implicant leaves
//! uncovered become a new state.

use crate::{
    cancel::CancelToken,
    dataset::Dataset,
    error::{Error, Result},
    heuristic::{Centralities, Params, Weights},
    sink::LogSink,
    stat::{rescale, round_resolution},
    term::{render_terms, Literal, LiteralTable, Term},
};
use bit_set::BitSet;
use itertools::Itertools;
use rayon::prelude::*;
use std::collections::{HashSet, VecDeque};

pub struct CoverageSearch<'a> {
    dataset: &'a Dataset,
    centralities: &'a Centralities,
    weights: Weights,
    resolution: f64,
    sink: &'a dyn LogSink,
    cancel: &'a CancelToken,
}

/// How literals compete while a term is grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ranking {
    /// Weighted score alone.
    Weighted,
    /// Most frequent among the covered rows first, weighted score second.
    /// Every pick keeps at least one covered row, so the term always covers
    /// part of the state.
    FrequencyFirst,
}

/// A literal appended to the term built by its parent node.
#[derive(Debug, Clone, Copy)]
struct TermNode {
    literal: Literal,
    parent: Option<usize>,
}

/// A partially built term waiting on the worklist.
#[derive(Debug)]
struct Branch {
    node: Option<usize>,
    /// Onset rows matched by the term.
    covering: BitSet,
    /// Offset rows still matched by the term.
    intersect: BitSet,
}

impl<'a> CoverageSearch<'a> {
    pub fn new(
        dataset: &'a Dataset,
        params: &Params,
        centralities: &'a Centralities,
        sink: &'a dyn LogSink,
        cancel: &'a CancelToken,
    ) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            dataset,
            centralities,
            weights: params.weights,
            resolution: params.resolution,
            sink,
            cancel,
        })
    }

    /// All distinct implicants found, in discovery order.
    pub fn run(&self) -> Result<Vec<Term>> {
        self.sink.emit("Starting the coverage-directed search...", None);

        let mut implicants = Vec::new();
        let mut known: HashSet<Term> = HashSet::new();

        let all: BitSet = (0..self.dataset.onset.len()).collect();
        let mut seen: HashSet<BitSet> = HashSet::from([all.clone()]);
        let mut frontier = VecDeque::from([all]);

        while let Some(uncovered) = frontier.pop_front() {
            self.cancel.check()?;
            if uncovered.is_empty() {
                continue;
            }

            let mut terms = self.construct_implicants(&uncovered, Ranking::Weighted);
            if !terms.iter().any(|t| self.covers_some(t, &uncovered)) {
                debug!(
                    rows = uncovered.len(),
                    "no weighted implicant covers the state, ranking by literal frequency first"
                );
                terms = self.construct_implicants(&uncovered, Ranking::FrequencyFirst);
            }

            let mut progress = false;
            for term in terms {
                if !self.covers_some(&term, &uncovered) {
                    debug!(%term, "implicant covers none of the uncovered rows");
                    continue;
                }
                progress = true;
                let remaining: BitSet = uncovered
                    .iter()
                    .filter(|&i| !term.covers(&self.dataset.onset[i]))
                    .collect();
                if known.insert(term.clone()) {
                    implicants.push(term);
                }
                if seen.insert(remaining.clone()) {
                    frontier.push_back(remaining);
                } else {
                    debug!("duplicate uncovered onset set discarded");
                }
            }
            if !progress {
                return Err(Error::Invariant(format!(
                    "no implicant separates the onset rows [{}] from the offset",
                    uncovered
                        .iter()
                        .map(|i| self.dataset.onset[i].to_string())
                        .join(", ")
                )));
            }
        }

        let table = render_terms(&implicants, &self.dataset.variables);
        self.sink
            .emit("Finished the coverage-directed search.", Some(table.as_slice()));
        self.sink
            .emit(&format!("{} implicants were found.", implicants.len()), None);
        Ok(implicants)
    }

    fn covers_some(&self, term: &Term, rows: &BitSet) -> bool {
        rows.iter().any(|i| term.covers(&self.dataset.onset[i]))
    }

    /// Every equally ranked implicant grown from the `uncovered` rows that
    /// covers none of the offset.
    fn construct_implicants(&self, uncovered: &BitSet, ranking: Ranking) -> Vec<Term> {
        let mut arena: Vec<TermNode> = Vec::new();
        let mut ans = Vec::new();
        let mut stack = vec![Branch {
            node: None,
            covering: uncovered.clone(),
            intersect: (0..self.dataset.offset.len()).collect(),
        }];

        while let Some(branch) = stack.pop() {
            let term = term_of(&arena, branch.node);
            if branch.intersect.is_empty() {
                if !ans.contains(&term) {
                    ans.push(term);
                }
                continue;
            }

            let candidates = self.literal_candidates(&branch.covering, &term, ranking);
            if candidates.is_empty() {
                debug!(%term, "no literal left to separate the term from the offset");
                continue;
            }

            // reversed so the first candidate is explored first
            for literal in candidates.into_iter().rev() {
                let mut covering: BitSet = branch
                    .covering
                    .iter()
                    .filter(|&i| literal.matches(&self.dataset.onset[i]))
                    .collect();
                if covering.is_empty() {
                    covering = branch.covering.clone();
                }
                let intersect = branch
                    .intersect
                    .iter()
                    .filter(|&i| literal.matches(&self.dataset.offset[i]))
                    .collect();

                arena.push(TermNode {
                    literal,
                    parent: branch.node,
                });
                stack.push(Branch {
                    node: Some(arena.len() - 1),
                    covering,
                    intersect,
                });
            }
        }
        ans
    }

    /// Unused literals with the best snapped score. A negated literal is
    /// dropped when its asserted form ties with it.
    ///
    /// Under [`Ranking::FrequencyFirst`] only the literals holding on the most
    /// `covering` rows compete on score.
    fn literal_candidates(
        &self,
        covering: &BitSet,
        term: &Term,
        ranking: Ranking,
    ) -> Vec<Literal> {
        let num_vars = self.dataset.num_vars();
        let counts = self.literal_counts(covering);
        let lf = LiteralTable::from(rescale(&counts));
        let used: BitSet = term.vars().collect();
        let sub = self.centralities.sub_degree(&used);
        let w = self.weights;

        let most_frequent = (0..num_vars)
            .filter(|&var| !used.contains(var))
            .flat_map(|var| [counts[Literal::asserted(var)], counts[Literal::negated(var)]])
            .fold(0., f64::max);

        let scores: Vec<Option<f64>> = (0..num_vars * 2)
            .into_par_iter()
            .map(|i| {
                let l = Literal::from_index(i);
                if used.contains(l.var) {
                    return None;
                }
                if ranking == Ranking::FrequencyFirst && counts[l] < most_frequent {
                    return None;
                }
                let score = w.literal_frequency * lf[l]
                    + w.degree * self.centralities.degree[l.var]
                    + w.betweenness * self.centralities.betweenness[l.var]
                    + w.sub_degree * sub[l.var];
                Some(round_resolution(score, self.resolution))
            })
            .collect();

        let best = match scores
            .iter()
            .flatten()
            .copied()
            .max_by(|a, b| a.total_cmp(b))
        {
            Some(best) => best,
            None => return vec![],
        };

        let mut ans = Vec::new();
        for var in 0..num_vars {
            let asserted = Literal::asserted(var);
            let negated = Literal::negated(var);
            let asserted_best = scores[asserted.index()] == Some(best);
            if asserted_best {
                ans.push(asserted);
            }
            if !asserted_best && scores[negated.index()] == Some(best) {
                ans.push(negated);
            }
        }

        if ans.len() > 1 {
            debug!(
                "multiple candidate literals for implicant construction: {}",
                ans.iter().join(", ")
            );
        }
        ans
    }

    /// How often each literal holds among the `covering` onset rows.
    fn literal_counts(&self, covering: &BitSet) -> LiteralTable<f64> {
        let mut counts = LiteralTable::new(self.dataset.num_vars(), 0.);
        for i in covering.iter() {
            for (var, &value) in self.dataset.onset[i].iter().enumerate() {
                counts[Literal::new(var, value)] += 1.;
            }
        }
        counts
    }
}

fn term_of(arena: &[TermNode], mut node: Option<usize>) -> Term {
    let mut ans = Term::new();
    while let Some(i) = node {
        ans.insert(arena[i].literal);
        node = arena[i].parent;
    }
    ans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        sink::MemorySink,
        term,
        tests::{dataset, SCENARIO},
    };

    fn search(dataset: &Dataset, params: &Params) -> Result<Vec<Term>> {
        let centralities = Centralities::new(dataset, params.density);
        let sink = MemorySink::new();
        let cancel = CancelToken::new();
        CoverageSearch::new(dataset, params, &centralities, &sink, &cancel)?.run()
    }

    fn equal_weights() -> Params {
        Params {
            weights: Weights::from_slice(&[1., 1., 1., 1.]).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario() {
        let implicants = search(&SCENARIO, &equal_weights()).unwrap();
        assert!(!implicants.is_empty());
        for row in &SCENARIO.onset {
            assert!(implicants.iter().any(|t| t.covers(row)));
        }
        for t in &implicants {
            assert!(!SCENARIO.intersects_offset(t), "{t} hits the offset");
        }
        assert!(implicants.contains(&term!(0)));
    }

    #[test]
    fn test_literal_candidates() {
        let centralities = Centralities::new(&SCENARIO, 0.25);
        let sink = MemorySink::new();
        let cancel = CancelToken::new();
        let params = Params {
            weights: Weights::from_slice(&[1., 0., 0., 0.]).unwrap(),
            ..Default::default()
        };
        let cds = CoverageSearch::new(&SCENARIO, &params, &centralities, &sink, &cancel).unwrap();

        // x0 holds on both onset rows
        let all: BitSet = (0..2).collect();
        let candidates = cds.literal_candidates(&all, &term!(), Ranking::Weighted);
        assert_eq!(vec![Literal::asserted(0)], candidates);

        // with x0 used, every remaining literal holds once
        let candidates = cds.literal_candidates(&all, &term!(0), Ranking::Weighted);
        assert_eq!(vec![Literal::asserted(1), Literal::asserted(2)], candidates);

        let counts = cds.literal_counts(&BitSet::from_iter([0]));
        assert_eq!(vec![0., 1., 0., 1., 1., 0.], counts.into_inner());
    }

    #[test]
    fn test_frequency_first_candidates() {
        let centralities = Centralities::new(&SCENARIO, 0.25);
        let sink = MemorySink::new();
        let cancel = CancelToken::new();
        let params = Params {
            weights: Weights::from_slice(&[0., 0., 0., 1.]).unwrap(),
            ..Default::default()
        };
        let cds = CoverageSearch::new(&SCENARIO, &params, &centralities, &sink, &cancel).unwrap();

        let all: BitSet = (0..2).collect();
        let candidates = cds.literal_candidates(&all, &term!(), Ranking::FrequencyFirst);
        assert_eq!(vec![Literal::asserted(0)], candidates);

        // among the unused variables only x1 and ~x2 hold on row 110
        let row: BitSet = BitSet::from_iter([0]);
        let candidates = cds.literal_candidates(&row, &term!(0), Ranking::FrequencyFirst);
        assert!(candidates
            .iter()
            .all(|l| *l == Literal::asserted(1) || *l == Literal::negated(2)));
        assert!(!candidates.is_empty());
    }

    #[test]
    fn test_centrality_only_weights_cover_onset() {
        // ~x0 alone separates the sets, but no weight looks at frequency
        let ds = dataset(
            &[&[0, 1, 1], &[0, 0, 0], &[0, 0, 1], &[0, 1, 0], &[0, 0, 0]],
            &[&[1, 1, 0], &[1, 0, 1]],
        );
        for weights in [[0., 1., 1., 0.], [0., 0., 0., 1.], [0., 1., 0., 0.]] {
            let params = Params {
                weights: Weights::from_slice(&weights).unwrap(),
                ..Default::default()
            };
            let implicants = search(&ds, &params).unwrap();
            assert!(ds.covers_onset(&implicants), "{weights:?}");
            for t in &implicants {
                assert!(!ds.intersects_offset(t), "{weights:?}: {t}");
                assert!(ds.onset.iter().any(|row| t.covers(row)));
            }
        }
    }

    #[test]
    fn test_collapsed_ties() {
        let params = Params {
            weights: Weights::from_slice(&[0.1, 0.1, 0.1, 0.1]).unwrap(),
            resolution: 1.,
            ..Default::default()
        };
        let implicants = search(&SCENARIO, &params).unwrap();
        assert!(SCENARIO.covers_onset(&implicants));
        for t in &implicants {
            assert!(!SCENARIO.intersects_offset(t));
        }
    }

    #[test]
    fn test_cancelled() {
        let centralities = Centralities::new(&SCENARIO, 0.25);
        let sink = MemorySink::new();
        let cancel = CancelToken::new();
        cancel.cancel();
        let params = Params::default();
        let cds = CoverageSearch::new(&SCENARIO, &params, &centralities, &sink, &cancel).unwrap();
        assert!(matches!(cds.run(), Err(crate::error::Error::Cancelled)));
    }

    #[test]
    fn test_deterministic() {
        let ds = dataset(
            &[&[1, 1, 0, 1], &[0, 1, 1, 1], &[1, 0, 1, 0], &[1, 1, 1, 0]],
            &[&[0, 0, 0, 1], &[0, 1, 0, 0], &[1, 0, 0, 1]],
        );
        let params = equal_weights();
        let first = search(&ds, &params).unwrap();
        for _ in 0..3 {
            assert_eq!(first, search(&ds, &params).unwrap());
        }
    }

    #[test]
    fn test_frequency_driven_search_covers_onset() {
        let ds = dataset(
            &[&[1, 1, 0, 1], &[0, 1, 1, 1], &[1, 0, 1, 0], &[1, 1, 1, 0]],
            &[&[0, 0, 0, 1], &[0, 1, 0, 0], &[1, 0, 0, 1]],
        );
        let params = Params {
            weights: Weights::from_slice(&[1., 0., 0., 0.]).unwrap(),
            ..Default::default()
        };
        let implicants = search(&ds, &params).unwrap();
        assert!(ds.covers_onset(&implicants));
        for t in &implicants {
            assert!(!ds.intersects_offset(t));
        }
    }

    #[test]
    fn test_rejects_zero_weights() {
        let centralities = Centralities::new(&SCENARIO, 0.25);
        let sink = MemorySink::new();
        let cancel = CancelToken::new();
        let mut params = Params::default();
        params.weights.literal_frequency = 0.;
        params.weights.degree = 0.;
        params.weights.betweenness = 0.;
        let err = CoverageSearch::new(&SCENARIO, &params, &centralities, &sink, &cancel)
            .err()
            .unwrap();
        assert!(err.is_config());
        assert!(sink.texts().is_empty());
    }
}
