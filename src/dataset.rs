use crate::{
    error::{Error, Result},
    term::Term,
};
use std::{collections::HashSet, fmt};

/// A crisp configuration.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    derive_more::Deref,
    derive_more::From,
    derive_more::Into,
)]
pub struct Minterm(Vec<bool>);

impl Minterm {
    /// Convert a row of `0.0` / `1.0` values. Returns `None` for any other value.
    pub fn from_crisp(row: &[f64]) -> Option<Self> {
        row.iter()
            .map(|&v| {
                if v == 0. {
                    Some(false)
                } else if v == 1. {
                    Some(true)
                } else {
                    None
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }

    pub fn to_values(&self) -> Vec<u8> {
        self.iter().map(|&b| b as u8).collect()
    }
}

impl fmt::Display for Minterm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.iter() {
            write!(f, "{}", *b as u8)?;
        }
        Ok(())
    }
}

/// Crisp onset and offset ready for minimization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub variables: Vec<String>,
    pub onset: Vec<Minterm>,
    pub offset: Vec<Minterm>,
}

impl Dataset {
    /// Validate and convert onset/offset rows with default variable names.
    pub fn new(onset: &[Vec<f64>], offset: &[Vec<f64>]) -> Result<Self> {
        let num_vars = onset.first().map(|r| r.len()).unwrap_or(0);
        let variables = (0..num_vars).map(|i| i.to_string()).collect();
        Self::with_variables(variables, onset, offset)
    }

    pub fn with_variables(
        variables: Vec<String>,
        onset: &[Vec<f64>],
        offset: &[Vec<f64>],
    ) -> Result<Self> {
        if onset.is_empty() {
            return Err(Error::config("onset is empty"));
        }
        if offset.is_empty() {
            return Err(Error::config("offset is empty"));
        }
        let num_vars = variables.len();
        if num_vars == 0 {
            return Err(Error::config("dataset has no variables"));
        }

        let convert = |set: &str, rows: &[Vec<f64>]| -> Result<Vec<Minterm>> {
            rows.iter()
                .enumerate()
                .map(|(i, row)| {
                    if row.len() != num_vars {
                        return Err(Error::config(format!(
                            "{set} row {i} has {} values, expected {num_vars}",
                            row.len()
                        )));
                    }
                    Minterm::from_crisp(row).ok_or_else(|| {
                        Error::config(format!(
                            "{set} row {i} is not crisp, calibrate the data first"
                        ))
                    })
                })
                .collect()
        };

        let onset = convert("onset", onset)?;
        let offset = convert("offset", offset)?;
        let offset_rows: HashSet<&Minterm> = offset.iter().collect();
        if let Some(shared) = onset.iter().find(|r| offset_rows.contains(r)) {
            return Err(Error::config(format!(
                "{shared} is in both the onset and the offset, clean the data first"
            )));
        }

        Ok(Self {
            onset,
            offset,
            variables,
        })
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    /// Whether the disjunction of `terms` holds for every onset row.
    pub fn covers_onset(&self, terms: &[Term]) -> bool {
        self.onset
            .iter()
            .all(|row| terms.iter().any(|t| t.covers(row)))
    }

    /// Whether `term` holds for some offset row.
    pub fn intersects_offset(&self, term: &Term) -> bool {
        self.offset.iter().any(|row| term.covers(row))
    }
}
