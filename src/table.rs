//! CSV ingestion and data preparation: validation, calibration and cleaning.

use crate::{
    dataset::Dataset,
    error::{Error, Result},
    sink::LogSink,
    stat::{mean, median},
};
use glob::glob;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    path::Path,
};

static VARIABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9\s._-]+$").expect("valid regex"));

/// Column statistic used as the calibration threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Mean,
    #[default]
    Median,
}

/// A dataset as read from a CSV file, split by outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub variables: Vec<String>,
    pub onset: Vec<Vec<f64>>,
    pub offset: Vec<Vec<f64>>,
}

impl Table {
    /// Read and validate a CSV file. The last column is the outcome.
    pub fn load(name: impl Into<String>, csv_path: impl AsRef<Path>, header: bool) -> Result<Self> {
        let csv_path = csv_path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(File::open(csv_path)?);

        let mut variables = Vec::new();
        let mut onset = Vec::new();
        let mut offset = Vec::new();
        let mut num_cols = None;
        let mut expect_header = header;

        for record in reader.into_records() {
            let record = record?;
            let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            if record.iter().any(|c| c.trim().is_empty()) {
                return Err(Error::data(line, "values must be non-empty"));
            }

            match num_cols {
                None if record.len() < 2 => {
                    return Err(Error::data(
                        line,
                        "at least one variable and the outcome are required",
                    ))
                }
                None => num_cols = Some(record.len()),
                Some(n) if n != record.len() => {
                    return Err(Error::data(
                        line,
                        format!("rows must have equal length, expected {n}, got {}", record.len()),
                    ))
                }
                Some(_) => {}
            }

            if expect_header {
                expect_header = false;
                let names: Vec<String> = record.iter().map(|c| c.to_string()).collect();
                if let Some(bad) = names.iter().find(|n| !VARIABLE_NAME.is_match(n)) {
                    return Err(Error::data(
                        line,
                        format!("variable name '{bad}' must be alphanumeric"),
                    ));
                }
                if names.iter().collect::<HashSet<_>>().len() != names.len() {
                    return Err(Error::data(line, "variable names must be unique"));
                }
                variables = names[..names.len() - 1].to_vec();
                continue;
            }

            let (outcome, cells) = match record.iter().collect::<Vec<_>>().split_last() {
                Some((outcome, cells)) => (outcome.trim().to_string(), cells.to_vec()),
                None => continue,
            };
            let row = cells
                .iter()
                .map(|c| match c.trim().parse::<f64>() {
                    Ok(v) if (0. ..=1.).contains(&v) => Ok(v),
                    Ok(v) => Err(Error::data(
                        line,
                        format!("value {v} is outside the interval [0, 1]"),
                    )),
                    Err(_) => Err(Error::data(line, format!("value '{c}' is not a number"))),
                })
                .collect::<Result<Vec<f64>>>()?;
            match outcome.as_str() {
                "1" => onset.push(row),
                "0" => offset.push(row),
                _ => return Err(Error::data(line, "outcomes must be 0 or 1")),
            }
        }

        let num_vars = match num_cols {
            Some(n) if !onset.is_empty() || !offset.is_empty() => n - 1,
            _ => return Err(Error::data(0, "the file has no data rows")),
        };
        if variables.is_empty() {
            variables = (0..num_vars).map(|i| i.to_string()).collect();
        }

        let ans = Self {
            name: name.into(),
            variables,
            onset,
            offset,
        };
        info!(
            "loaded {} from {}: {} variables, {} onset rows, {} offset rows",
            ans.name,
            csv_path.display(),
            num_vars,
            ans.onset.len(),
            ans.offset.len()
        );
        Ok(ans)
    }

    /// Load every `*.csv` file of a directory, in path order.
    pub fn load_dir(dir: impl AsRef<Path>, header: bool) -> anyhow::Result<Vec<Self>> {
        let dir = dir.as_ref();
        let mut ans = Vec::new();
        for csv_f in glob(&dir.join("*.csv").to_string_lossy())? {
            let csv_f = csv_f?;
            let name = csv_f
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let table = Table::load(name, &csv_f, header)
                .map_err(|e| anyhow::anyhow!("{}: {e}", csv_f.display()))?;
            ans.push(table);
        }
        Ok(ans)
    }

    pub fn num_vars(&self) -> usize {
        self.variables.len()
    }

    pub fn is_crisp(&self) -> bool {
        self.onset
            .iter()
            .chain(&self.offset)
            .flatten()
            .all(|&v| v == 0. || v == 1.)
    }

    /// Turn fuzzy values crisp: a value above its column's mean or median
    /// becomes 1, anything else 0.
    pub fn calibrate(&mut self, stat: Stat) {
        let thresholds: Vec<f64> = (0..self.num_vars())
            .map(|j| {
                let column: Vec<f64> = self.onset.iter().chain(&self.offset).map(|r| r[j]).collect();
                match stat {
                    Stat::Mean => mean(&column),
                    Stat::Median => median(&column),
                }
                .unwrap_or(0.)
            })
            .collect();
        debug!(?stat, ?thresholds, "calibration thresholds");

        for row in self.onset.iter_mut().chain(self.offset.iter_mut()) {
            for (v, t) in row.iter_mut().zip(&thresholds) {
                *v = if *v > *t { 1. } else { 0. };
            }
        }
    }

    /// Resolve configurations present in both onset and offset. The set where
    /// the configuration makes up the larger proportion keeps it; on a tie it
    /// is dropped from both. Returns the number of removed onset and offset rows.
    pub fn clean(&mut self, sink: &dyn LogSink) -> (usize, usize) {
        fn key(row: &[f64]) -> Vec<u64> {
            row.iter().map(|v| v.to_bits()).collect()
        }
        fn count(rows: &[Vec<f64>]) -> HashMap<Vec<u64>, usize> {
            let mut ans = HashMap::new();
            for r in rows {
                *ans.entry(key(r)).or_default() += 1;
            }
            ans
        }

        let onset_counts = count(&self.onset);
        let offset_counts = count(&self.offset);
        let num_onset = self.onset.len() as f64;
        let num_offset = self.offset.len() as f64;

        let mut drop_onset = HashSet::new();
        let mut drop_offset = HashSet::new();
        for (k, &on) in &onset_counts {
            let off = match offset_counts.get(k) {
                Some(&off) => off,
                None => continue,
            };
            let on_prop = on as f64 / num_onset;
            let off_prop = off as f64 / num_offset;
            if on_prop >= off_prop {
                drop_offset.insert(k.clone());
            }
            if on_prop <= off_prop {
                drop_onset.insert(k.clone());
            }
        }

        let removed_onset = drain_matching(&mut self.onset, &drop_onset);
        let removed_offset = drain_matching(&mut self.offset, &drop_offset);
        for (set, removed) in [("onset", &removed_onset), ("offset", &removed_offset)] {
            if removed.is_empty() {
                continue;
            }
            let table: Vec<Vec<String>> = removed
                .iter()
                .map(|r| r.iter().map(|v| v.to_string()).collect())
                .collect();
            sink.emit(
                &format!("The following minterms were removed from the {set} due to conflicts:"),
                Some(table.as_slice()),
            );
        }
        (removed_onset.len(), removed_offset.len())
    }

    pub fn into_dataset(self) -> Result<Dataset> {
        Dataset::with_variables(self.variables, &self.onset, &self.offset)
    }
}

/// Remove the rows whose bit pattern is in `keys`, keeping the order of the rest.
fn drain_matching(rows: &mut Vec<Vec<f64>>, keys: &HashSet<Vec<u64>>) -> Vec<Vec<f64>> {
    let (removed, kept): (Vec<_>, Vec<_>) = rows
        .drain(..)
        .partition(|r| keys.contains(&r.iter().map(|v| v.to_bits()).collect::<Vec<_>>()));
    *rows = kept;
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn load(content: &str, header: bool) -> Result<Table> {
        let f = write_csv(content);
        Table::load("t", f.path(), header)
    }

    fn data_line(err: Error) -> usize {
        match err {
            Error::Data { line, .. } => line,
            e => panic!("unexpected error {e}"),
        }
    }

    #[test]
    fn test_load() {
        let t = load("rain,wind,storm\n1,0,1\n0,0,0\n1,1,1\n", true).unwrap();
        assert_eq!(vec!["rain", "wind"], t.variables);
        assert_eq!(vec![vec![1., 0.], vec![1., 1.]], t.onset);
        assert_eq!(vec![vec![0., 0.]], t.offset);
        assert!(t.is_crisp());

        let t = load("0.5,0.2,1\n0,1,0\n", false).unwrap();
        assert_eq!(vec!["0", "1"], t.variables);
        assert!(!t.is_crisp());
    }

    #[test]
    fn test_validation() {
        assert_eq!(2, data_line(load("a,b\n1,\n", true).unwrap_err()));
        assert_eq!(1, data_line(load("a,b!,c\n1,0,1\n", true).unwrap_err()));
        assert_eq!(1, data_line(load("a,a,c\n1,0,1\n", true).unwrap_err()));
        assert_eq!(3, data_line(load("a,b,c\n1,0,1\n1.5,0,1\n", true).unwrap_err()));
        assert_eq!(2, data_line(load("1,0,1\nx,0,0\n", false).unwrap_err()));
        assert_eq!(1, data_line(load("1,0,2\n", false).unwrap_err()));
        assert_eq!(1, data_line(load("1,0,0.5\n", false).unwrap_err()));
        assert_eq!(2, data_line(load("1,0,1\n1,1\n", false).unwrap_err()));
        assert_eq!(0, data_line(load("a,b,c\n", true).unwrap_err()));
        assert_eq!(0, data_line(load("", false).unwrap_err()));
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.csv"), "1,1\n0,0\n").unwrap();
        std::fs::write(dir.path().join("a.csv"), "1,0,1\n0,1,0\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let tables = Table::load_dir(dir.path(), false).unwrap();
        let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(vec!["a", "b"], names);
    }

    #[test]
    fn test_calibrate() {
        let mut t = Table {
            name: "t".into(),
            variables: vec!["a".into(), "b".into()],
            onset: vec![vec![0.9, 0.1], vec![0.6, 0.4]],
            offset: vec![vec![0.2, 0.9], vec![0.5, 0.3]],
        };
        let mut by_mean = t.clone();
        // medians 0.55 and 0.35
        t.calibrate(Stat::Median);
        assert_eq!(vec![vec![1., 0.], vec![1., 1.]], t.onset);
        assert_eq!(vec![vec![0., 1.], vec![0., 0.]], t.offset);
        assert!(t.is_crisp());

        // means 0.55 and 0.425
        by_mean.calibrate(Stat::Mean);
        assert_eq!(vec![vec![1., 0.], vec![1., 0.]], by_mean.onset);
        assert_eq!(vec![vec![0., 1.], vec![0., 0.]], by_mean.offset);
    }

    #[test]
    fn test_clean() {
        let mut t = Table {
            name: "t".into(),
            variables: vec!["a".into(), "b".into()],
            // 11 is half of the onset but a third of the offset
            // 00 is a quarter of the onset and a third of the offset
            onset: vec![vec![1., 1.], vec![1., 1.], vec![0., 0.], vec![1., 0.]],
            offset: vec![vec![1., 1.], vec![0., 0.], vec![0., 1.]],
        };
        let sink = MemorySink::new();
        assert_eq!((1, 1), t.clean(&sink));
        assert_eq!(vec![vec![1., 1.], vec![1., 1.], vec![1., 0.]], t.onset);
        assert_eq!(vec![vec![0., 0.], vec![0., 1.]], t.offset);

        let messages = sink.messages();
        assert_eq!(2, messages.len());
        assert!(messages[0].text.contains("onset"));
        assert_eq!(Some(vec![vec!["0".to_string(), "0".to_string()]]), messages[0].table);
    }

    #[test]
    fn test_clean_tie_drops_both() {
        let mut t = Table {
            name: "t".into(),
            variables: vec!["a".into()],
            onset: vec![vec![1.], vec![0.]],
            offset: vec![vec![1.], vec![0.]],
        };
        assert_eq!((2, 2), t.clean(&MemorySink::new()));
        assert!(t.onset.is_empty());
        assert!(t.into_dataset().unwrap_err().is_config());
    }
}
