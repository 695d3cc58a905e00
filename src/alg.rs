mod cover;
mod expansion;
mod search;

pub use cover::{CoverStrategy, UnateCover};
pub use expansion::ImplicantExpansion;
pub use search::CoverageSearch;
