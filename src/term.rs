//! Literals and product terms over crisp configurations.
#![allow(clippy::module_inception)]

mod literal;
mod term;

pub use literal::{Literal, LiteralTable};
pub use term::Term;

/// Render a list of terms as rows of named literals, one row per term.
pub fn render_terms<'a>(
    terms: impl IntoIterator<Item = &'a Term>,
    names: &[String],
) -> Vec<Vec<String>> {
    terms
        .into_iter()
        .map(|t| t.iter().map(|l| l.display_with(names)).collect())
        .collect()
}
