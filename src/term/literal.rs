use serde::{Deserialize, Serialize};
use std::{
    fmt,
    ops::{Index, IndexMut},
};

/// A variable together with the value it is required to take.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Constructor,
)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Literal {
    #[cfg_attr(test, proptest(strategy = "0usize..8"))]
    pub var: usize,
    pub polarity: bool,
}

impl Literal {
    pub fn asserted(var: usize) -> Self {
        Self::new(var, true)
    }

    pub fn negated(var: usize) -> Self {
        Self::new(var, false)
    }

    /// Slot of the literal in a [`LiteralTable`].
    #[inline]
    pub fn index(&self) -> usize {
        self.var * 2 + self.polarity as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        Self::new(index / 2, index % 2 == 1)
    }

    pub fn complement(&self) -> Self {
        Self::new(self.var, !self.polarity)
    }

    /// Whether `row` takes the value this literal asks for.
    #[inline]
    pub fn matches(&self, row: &[bool]) -> bool {
        row[self.var] == self.polarity
    }

    pub fn display_with(&self, names: &[String]) -> String {
        let name = names
            .get(self.var)
            .cloned()
            .unwrap_or_else(|| self.var.to_string());
        if self.polarity {
            name
        } else {
            format!("~{name}")
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.polarity {
            write!(f, "{}", self.var)
        } else {
            write!(f, "~{}", self.var)
        }
    }
}

/// Fixed-size table with one slot per literal of `num_vars` variables.
#[derive(Debug, Clone, PartialEq, derive_more::Deref, derive_more::From)]
pub struct LiteralTable<T>(Vec<T>);

impl<T: Clone> LiteralTable<T> {
    pub fn new(num_vars: usize, init: T) -> Self {
        Self(vec![init; num_vars * 2])
    }
}

impl<T> LiteralTable<T> {
    pub fn from_fn(num_vars: usize, f: impl FnMut(Literal) -> T) -> Self {
        Self((0..num_vars * 2).map(Literal::from_index).map(f).collect())
    }

    pub fn num_vars(&self) -> usize {
        self.0.len() / 2
    }

    pub fn entries(&self) -> impl Iterator<Item = (Literal, &T)> {
        self.0
            .iter()
            .enumerate()
            .map(|(i, v)| (Literal::from_index(i), v))
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Index<Literal> for LiteralTable<T> {
    type Output = T;

    fn index(&self, literal: Literal) -> &T {
        &self.0[literal.index()]
    }
}

impl<T> IndexMut<Literal> for LiteralTable<T> {
    fn index_mut(&mut self, literal: Literal) -> &mut T {
        &mut self.0[literal.index()]
    }
}
