use anyhow::{Context, Error, Result};
use serde::Serialize;
use std::{fs::File, io::BufWriter, path::Path};
use tracing_subscriber::EnvFilter;

/// Log to stderr so stdout stays free for the rendered results.
pub fn init_tracing_subscriber(default_filter: &str) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(Error::msg)
}

pub fn setup_rayon(num_threads: Option<usize>) -> Result<()> {
    if let Some(num_threads) = num_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()?;
    }
    debug!("rayon pool with {} threads", rayon::current_num_threads());
    Ok(())
}

pub fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let out = BufWriter::new(
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
    );
    serde_json::to_writer_pretty(out, value)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json(&path, &vec![1, 2]).unwrap();
        let back: Vec<u32> = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(vec![1, 2], back);
        assert!(write_json(&dir.path().join("missing/out.json"), &1).is_err());
    }
}
