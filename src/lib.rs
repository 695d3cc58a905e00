#[macro_use]
extern crate tracing;

pub mod alg;
pub mod analysis;
pub mod cancel;
pub mod error;
pub mod graph;
pub mod heuristic;
pub mod sink;
pub mod stat;
pub mod term;
pub mod utils;

pub mod table;
pub use table::*;

pub mod dataset;
pub use dataset::*;


pub use alg::CoverStrategy;
pub use analysis::{analyse, Analysis, Report, ReportTree, Timings};
pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use heuristic::{Centralities, Params, Weights};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use term::{Literal, Term};

mod serde_time {
    use serde::{de::Deserializer, ser::Serializer, Deserialize};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(t: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(t.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let t = <f64>::deserialize(d)?;
        Ok(Duration::from_secs_f64(t))
    }
}
