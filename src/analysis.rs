//! The causality analysis pipeline: centralities, search, expansion and cover.

use crate::{
    alg::{CoverageSearch, ImplicantExpansion, UnateCover},
    cancel::CancelToken,
    dataset::Dataset,
    error::Result,
    heuristic::{Centralities, Params},
    serde_time,
    sink::LogSink,
    term::Term,
};
use ptree::{Style, TreeItem};
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    io,
    time::{Duration, Instant},
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timings {
    #[serde(with = "serde_time")]
    pub centrality: Duration,
    #[serde(with = "serde_time")]
    pub search: Duration,
    #[serde(with = "serde_time")]
    pub expansion: Duration,
    #[serde(with = "serde_time")]
    pub cover: Duration,
    #[serde(with = "serde_time")]
    pub total: Duration,
}

/// Output of every stage of one run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub implicants: Vec<Term>,
    pub prime_implicants: Vec<Term>,
    pub essentials: Vec<Term>,
    pub timings: Timings,
}

/// Run the whole minimization on `dataset`.
///
/// Parameters are checked before anything is computed. Any error aborts the
/// run, so a returned cover always explains the whole onset.
pub fn analyse(
    dataset: &Dataset,
    params: &Params,
    sink: &dyn LogSink,
    cancel: &CancelToken,
) -> Result<Analysis> {
    params.validate()?;
    sink.emit("Beginning the causality analysis.", None);
    let begin = Instant::now();
    let mut timings = Timings::default();

    let stage = Instant::now();
    let centralities = Centralities::new(dataset, params.density);
    timings.centrality = stage.elapsed();

    let stage = Instant::now();
    let implicants =
        CoverageSearch::new(dataset, params, &centralities, sink, cancel)?.run()?;
    timings.search = stage.elapsed();

    let stage = Instant::now();
    let prime_implicants =
        ImplicantExpansion::new(dataset, &centralities, sink, cancel).run(&implicants)?;
    timings.expansion = stage.elapsed();

    let stage = Instant::now();
    let essentials = UnateCover::new(dataset, params.cover, sink).run(&prime_implicants)?;
    timings.cover = stage.elapsed();

    timings.total = begin.elapsed();
    sink.emit("Finished the causality analysis.", None);
    info!(
        "{} implicants, {} prime implicants, {} essentials in {:?}",
        implicants.len(),
        prime_implicants.len(),
        essentials.len(),
        timings.total
    );

    Ok(Analysis {
        implicants,
        prime_implicants,
        essentials,
        timings,
    })
}

impl Analysis {
    pub fn report(&self, name: impl Into<String>, dataset: &Dataset, params: &Params) -> Report {
        let render = |terms: &[Term]| -> Vec<String> {
            terms
                .iter()
                .map(|t| t.display_with(&dataset.variables))
                .collect()
        };
        Report {
            name: name.into(),
            variables: dataset.variables.clone(),
            num_onset: dataset.onset.len(),
            num_offset: dataset.offset.len(),
            params: *params,
            implicants: render(&self.implicants),
            prime_implicants: render(&self.prime_implicants),
            essentials: render(&self.essentials),
            timings: self.timings,
        }
    }
}

/// Presentation of an [`Analysis`] with terms rendered by variable name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub variables: Vec<String>,
    pub num_onset: usize,
    pub num_offset: usize,
    pub params: Params,
    pub implicants: Vec<String>,
    pub prime_implicants: Vec<String>,
    pub essentials: Vec<String>,
    pub timings: Timings,
}

impl Report {
    pub fn tree(&self) -> ReportTree {
        let group = |label: &str, terms: &[String]| ReportTree::Group {
            label: format!("{label} ({})", terms.len()),
            children: terms.iter().cloned().map(ReportTree::Term).collect(),
        };
        ReportTree::Group {
            label: self.name.clone(),
            children: vec![
                group("implicants", &self.implicants),
                group("prime implicants", &self.prime_implicants),
                group("essential prime implicants", &self.essentials),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTree {
    Group {
        label: String,
        children: Vec<ReportTree>,
    },
    Term(String),
}

impl TreeItem for ReportTree {
    type Child = Self;

    fn write_self<W: io::Write>(&self, f: &mut W, style: &Style) -> io::Result<()> {
        match self {
            Self::Group { label, .. } => write!(f, "{}", style.paint(label)),
            Self::Term(term) => write!(f, "{}", style.paint(term)),
        }
    }

    fn children(&self) -> Cow<[Self::Child]> {
        match self {
            Self::Group { children, .. } => Cow::from(children),
            Self::Term(_) => Cow::from(vec![]),
        }
    }
}
