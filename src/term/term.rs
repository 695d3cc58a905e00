use super::Literal;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

/// A conjunction of literals.
///
/// No two literals share a variable. If the underlying set is empty, the term
/// is considered as TRUE.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Deref,
    derive_more::AsRef,
)]
#[as_ref(forward)]
pub struct Term(BTreeSet<Literal>);

impl Term {
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a literal. Refuses a literal whose variable is already constrained.
    pub fn insert(&mut self, literal: Literal) -> bool {
        if self.has_var(literal.var) {
            return false;
        }
        self.0.insert(literal)
    }

    pub fn remove(&mut self, literal: &Literal) -> bool {
        self.0.remove(literal)
    }

    /// A copy of this term without `literal`.
    pub fn without(&self, literal: &Literal) -> Term {
        let mut ans = self.clone();
        ans.remove(literal);
        ans
    }

    pub fn has_var(&self, var: usize) -> bool {
        self.0.contains(&Literal::asserted(var)) || self.0.contains(&Literal::negated(var))
    }

    pub fn vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.iter().map(|l| l.var)
    }

    /// Eval to TRUE or FALSE against a configuration.
    pub fn covers(&self, row: &[bool]) -> bool {
        self.iter().all(|l| l.matches(row))
    }

    /// Number of literals disagreeing with `row`.
    pub fn distance(&self, row: &[bool]) -> usize {
        self.iter().filter(|l| !l.matches(row)).count()
    }

    pub fn display_with(&self, names: &[String]) -> String {
        if self.is_empty() {
            return "TRUE".to_string();
        }
        self.iter()
            .map(|l| l.display_with(names))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for Term {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl FromIterator<Literal> for Term {
    fn from_iter<I: IntoIterator<Item = Literal>>(iter: I) -> Self {
        let mut ans = Term::new();
        for l in iter {
            let inserted = ans.insert(l);
            debug_assert!(inserted || ans.contains(&l), "conflicting literal {l}");
        }
        ans
    }
}

impl IntoIterator for Term {
    type Item = <BTreeSet<Literal> as IntoIterator>::Item;
    type IntoIter = <BTreeSet<Literal> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Term {
    type Item = &'a Literal;
    type IntoIter = std::collections::btree_set::Iter<'a, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Term {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Shorter terms first, used when presenting sorted terms.
        self.len()
            .cmp(&other.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "TRUE");
        }

        for (i, l) in self.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{l}")?;
        }
        Ok(())
    }
}

/// Build a [`Term`] from variable indices; `!` marks a negated literal.
#[macro_export]
macro_rules! term {
    () => {
        $crate::term::Term::new()
    };
    (@acc $t:ident ;) => {};
    (@acc $t:ident ; ! $v:literal $($rest:tt)*) => {
        $t.insert($crate::term::Literal::negated($v));
        $crate::term!(@acc $t ; $($rest)*);
    };
    (@acc $t:ident ; $v:literal $($rest:tt)*) => {
        $t.insert($crate::term::Literal::asserted($v));
        $crate::term!(@acc $t ; $($rest)*);
    };
    ($($rest:tt)+) => {{
        let mut t = $crate::term::Term::new();
        $crate::term!(@acc t ; $($rest)+);
        t
    }};
}
