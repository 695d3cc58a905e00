//! Heuristic parameters and the per-variable centralities that rank literals.

use crate::{
    alg::CoverStrategy,
    dataset::Dataset,
    error::{Error, Result},
    graph::Graph,
    stat::rescale,
};
use bit_set::BitSet;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RESOLUTION: f64 = 0.00001;
pub const DEFAULT_DENSITY: f64 = 0.25;

/// Ratios of the four literal scoring heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub literal_frequency: f64,
    pub degree: f64,
    pub betweenness: f64,
    pub sub_degree: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            literal_frequency: 0.5,
            degree: 0.25,
            betweenness: 0.25,
            sub_degree: 0.,
        }
    }
}

impl Weights {
    /// Read the weights in the order literal frequency, degree, betweenness,
    /// sub-degree. Extra values are ignored.
    pub fn from_slice(values: &[f64]) -> Result<Self> {
        if values.len() < 4 {
            return Err(Error::config(format!(
                "4 heuristic weights are required, got {}",
                values.len()
            )));
        }
        if values.len() > 4 {
            warn!("ignoring {} extra heuristic weights", values.len() - 4);
        }
        let ans = Self {
            literal_frequency: values[0],
            degree: values[1],
            betweenness: values[2],
            sub_degree: values[3],
        };
        ans.validate()?;
        Ok(ans)
    }

    pub fn to_array(self) -> [f64; 4] {
        [
            self.literal_frequency,
            self.degree,
            self.betweenness,
            self.sub_degree,
        ]
    }

    pub fn validate(&self) -> Result<()> {
        let values = self.to_array();
        if let Some(w) = values.iter().find(|w| !w.is_finite() || **w < 0.) {
            return Err(Error::config(format!(
                "heuristic weights must be non-negative numbers, got {w}"
            )));
        }
        if values.iter().all(|w| *w == 0.) {
            return Err(Error::config("at least one heuristic weight must be > 0"));
        }
        Ok(())
    }
}

/// Everything the minimization needs besides the data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub weights: Weights,
    /// Literal scores are snapped to multiples of this value.
    pub resolution: f64,
    /// Fraction of co-occurrence pairs used as the edge cutoff.
    pub density: f64,
    pub cover: CoverStrategy,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            weights: Weights::default(),
            resolution: DEFAULT_RESOLUTION,
            density: DEFAULT_DENSITY,
            cover: CoverStrategy::default(),
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if !self.resolution.is_finite() || self.resolution <= 0. {
            return Err(Error::config(format!(
                "resolution must be > 0, got {}",
                self.resolution
            )));
        }
        if !(0. ..=1.).contains(&self.density) {
            return Err(Error::config(format!(
                "density must be within [0, 1], got {}",
                self.density
            )));
        }
        if self.resolution > DEFAULT_RESOLUTION {
            warn!(
                "rough resolution {} may cause many ties and a slower analysis",
                self.resolution
            );
        }
        Ok(())
    }
}

/// Combined onset/offset centralities of every variable.
///
/// Degree uses the co-occurrence graphs, betweenness their inverted
/// counterparts. Each score is `rescale(onset_raw - offset_raw)`.
#[derive(Debug)]
pub struct Centralities {
    pub degree: Vec<f64>,
    pub betweenness: Vec<f64>,
    onset_graph: Graph,
    offset_graph: Graph,
    sub_degree_cache: DashMap<BitSet, Vec<f64>>,
}

impl Centralities {
    pub fn new(dataset: &Dataset, density: f64) -> Self {
        let num_vars = dataset.num_vars();
        let onset_graph = Graph::build(&dataset.onset, num_vars, density);
        let offset_graph = Graph::build(&dataset.offset, num_vars, density);
        debug!(
            onset_edges = onset_graph.edges().len(),
            offset_edges = offset_graph.edges().len(),
            onset_connected = onset_graph.is_connected(),
            offset_connected = offset_graph.is_connected(),
            "co-occurrence graphs built"
        );

        let degree = combine(&onset_graph.degree(true), &offset_graph.degree(true));
        let betweenness = combine(
            &onset_graph.inverted().betweenness(),
            &offset_graph.inverted().betweenness(),
        );

        Self {
            degree,
            betweenness,
            onset_graph,
            offset_graph,
            sub_degree_cache: DashMap::new(),
        }
    }

    pub fn num_vars(&self) -> usize {
        self.degree.len()
    }

    pub fn onset_graph(&self) -> &Graph {
        &self.onset_graph
    }

    pub fn offset_graph(&self) -> &Graph {
        &self.offset_graph
    }

    /// Affinity of every variable with the variables in `subset`.
    pub fn sub_degree(&self, subset: &BitSet) -> Vec<f64> {
        if let Some(v) = self.sub_degree_cache.get(subset) {
            return v.clone();
        }

        let ans = combine(
            &self.onset_graph.sub_degree(subset),
            &self.offset_graph.sub_degree(subset),
        );
        self.sub_degree_cache.insert(subset.clone(), ans.clone());
        ans
    }
}

fn combine(onset: &[f64], offset: &[f64]) -> Vec<f64> {
    let diff: Vec<f64> = onset.iter().zip(offset).map(|(a, b)| a - b).collect();
    rescale(&diff)
}
