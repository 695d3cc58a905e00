//! Implicant expansion: drop literals until every remaining one is needed to
//! keep the term away from the offset.

use crate::{
    cancel::CancelToken,
    dataset::Dataset,
    error::{Error, Result},
    heuristic::Centralities,
    sink::LogSink,
    term::{render_terms, Literal, Term},
};
use itertools::Itertools;
use std::collections::HashSet;

pub struct ImplicantExpansion<'a> {
    dataset: &'a Dataset,
    centralities: &'a Centralities,
    sink: &'a dyn LogSink,
    cancel: &'a CancelToken,
}

impl<'a> ImplicantExpansion<'a> {
    pub fn new(
        dataset: &'a Dataset,
        centralities: &'a Centralities,
        sink: &'a dyn LogSink,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            dataset,
            centralities,
            sink,
            cancel,
        }
    }

    /// Distinct prime implicants reachable from `implicants`, in the order
    /// they are first reached.
    pub fn run(&self, implicants: &[Term]) -> Result<Vec<Term>> {
        self.sink.emit("Starting the implicant expansion...", None);

        let mut primes = Vec::new();
        let mut emitted: HashSet<Term> = HashSet::new();
        // a term's removals are explored once no matter how it was reached
        let mut visited: HashSet<Term> = HashSet::new();

        for implicant in implicants {
            let mut stack = vec![implicant.clone()];
            while let Some(term) = stack.pop() {
                self.cancel.check()?;
                if !visited.insert(term.clone()) {
                    continue;
                }

                let candidates = self.removal_candidates(&term);
                if candidates.is_empty() {
                    if self.dataset.intersects_offset(&term) {
                        return Err(Error::Invariant(format!(
                            "prime implicant {} intersects the offset",
                            term.display_with(&self.dataset.variables)
                        )));
                    }
                    if emitted.insert(term.clone()) {
                        primes.push(term);
                    }
                    continue;
                }

                if candidates.len() > 1 {
                    debug!(
                        "multiple candidate literals for removal from {}: {}",
                        term,
                        candidates.iter().join(", ")
                    );
                }
                for literal in candidates.iter().rev() {
                    stack.push(term.without(literal));
                }
            }
        }

        let table = render_terms(&primes, &self.dataset.variables);
        self.sink
            .emit("Finished the implicant expansion.", Some(table.as_slice()));
        self.sink
            .emit(&format!("{} prime implicants were found.", primes.len()), None);
        Ok(primes)
    }

    /// Literals whose removal keeps the term at the largest positive distance
    /// from the offset, ties broken by ascending degree then betweenness.
    fn removal_candidates(&self, term: &Term) -> Vec<Literal> {
        let offset = &self.dataset.offset;
        let distances: Vec<usize> = offset.iter().map(|row| term.distance(row)).collect();

        let criteria: Vec<(Literal, usize, f64, f64)> = term
            .iter()
            .map(|&l| {
                let min_distance = offset
                    .iter()
                    .zip(&distances)
                    .map(|(row, d)| if l.matches(row) { *d } else { d - 1 })
                    .min()
                    .unwrap_or(0);
                (
                    l,
                    min_distance,
                    self.centralities.degree[l.var],
                    self.centralities.betweenness[l.var],
                )
            })
            .collect();

        let best = criteria.iter().min_by(|a, b| {
            b.1.cmp(&a.1)
                .then_with(|| a.2.total_cmp(&b.2))
                .then_with(|| a.3.total_cmp(&b.3))
        });
        let (_, best_distance, best_degree, best_betweenness) = match best {
            Some(&(l, d, deg, bet)) if d > 0 => (l, d, deg, bet),
            _ => return vec![],
        };

        criteria
            .iter()
            .filter(|c| c.1 == best_distance && c.2 == best_degree && c.3 == best_betweenness)
            .map(|c| c.0)
            .collect()
    }
}
