//! Greedy unate covering of the onset by prime implicants.

use crate::{
    dataset::Dataset,
    error::{Error, Result},
    sink::LogSink,
    term::{render_terms, LiteralTable, Term},
};
use bit_set::BitSet;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Column selection rule of the covering loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverStrategy {
    /// Most remaining rows, then fewest literals, then highest
    /// weighted-literal weighted-output score.
    #[default]
    Wlwo,
    /// Most rows no other column covers, then most remaining rows, then
    /// fewest literals.
    Lcmc,
}

pub struct UnateCover<'a> {
    dataset: &'a Dataset,
    strategy: CoverStrategy,
    sink: &'a dyn LogSink,
}

/// Per column scores of one covering round.
struct Round {
    potential: Vec<usize>,
    unique: Vec<usize>,
}

impl<'a> UnateCover<'a> {
    pub fn new(dataset: &'a Dataset, strategy: CoverStrategy, sink: &'a dyn LogSink) -> Self {
        Self {
            dataset,
            strategy,
            sink,
        }
    }

    /// Essential prime implicants in selection order.
    pub fn run(&self, primes: &[Term]) -> Result<Vec<Term>> {
        self.sink.emit("Starting the unate covering...", None);

        let onset = &self.dataset.onset;
        let columns: Vec<BitSet> = primes
            .iter()
            .map(|t| (0..onset.len()).filter(|&i| t.covers(&onset[i])).collect())
            .collect();
        let lengths: Vec<usize> = primes.iter().map(|t| t.len()).collect();
        let wlwo = self.wlwo(primes);

        let mut remaining: BitSet = (0..onset.len()).collect();
        let mut essentials = Vec::new();

        while !remaining.is_empty() {
            let round = Round::new(&columns, &remaining, onset.len());
            let best = (0..primes.len()).min_by(|&a, &b| match self.strategy {
                CoverStrategy::Wlwo => round.potential[b]
                    .cmp(&round.potential[a])
                    .then_with(|| lengths[a].cmp(&lengths[b]))
                    .then_with(|| wlwo[b].cmp(&wlwo[a]))
                    .then_with(|| a.cmp(&b)),
                CoverStrategy::Lcmc => round.unique[b]
                    .cmp(&round.unique[a])
                    .then_with(|| round.potential[b].cmp(&round.potential[a]))
                    .then_with(|| lengths[a].cmp(&lengths[b]))
                    .then_with(|| a.cmp(&b)),
            });

            let best = match best {
                Some(j) if round.potential[j] > 0 => j,
                _ => {
                    return Err(Error::Invariant(format!(
                        "no prime implicant covers the onset rows [{}]",
                        remaining.iter().map(|i| onset[i].to_string()).join(", ")
                    )))
                }
            };
            remaining.difference_with(&columns[best]);
            essentials.push(primes[best].clone());
        }

        let table = render_terms(&essentials, &self.dataset.variables);
        self.sink
            .emit("Finished the unate covering.", Some(table.as_slice()));
        let found = format!("{} essential prime implicants were found.", essentials.len());
        self.sink.emit(&found, None);
        Ok(essentials)
    }

    /// Sum of the occurrence counts of a term's literals across all primes,
    /// times the onset size.
    fn wlwo(&self, primes: &[Term]) -> Vec<usize> {
        let mut counts = LiteralTable::new(self.dataset.num_vars(), 0usize);
        for l in primes.iter().flatten() {
            counts[*l] += 1;
        }
        primes
            .iter()
            .map(|t| t.iter().map(|l| counts[*l]).sum::<usize>() * self.dataset.onset.len())
            .collect()
    }
}

impl Round {
    fn new(columns: &[BitSet], remaining: &BitSet, num_rows: usize) -> Self {
        // bit-set iterators under-report their upper size hint, so nothing
        // here goes through `Iterator::count` on them
        let potential: Vec<usize> = columns
            .iter()
            .map(|c| {
                let mut live = c.clone();
                live.intersect_with(remaining);
                live.len()
            })
            .collect();

        let mut hits = vec![0usize; num_rows];
        for c in columns {
            for i in c.intersection(remaining) {
                hits[i] += 1;
            }
        }
        let unique = columns
            .iter()
            .map(|c| {
                c.intersection(remaining)
                    .fold(0, |n, i| n + usize::from(hits[i] == 1))
            })
            .collect();

        Self { potential, unique }
    }
}
