#[macro_use]
extern crate tracing;

use anyhow::{Context, Result};
use care::*;
use clap::{Parser, ValueEnum};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    time::Instant,
};

#[derive(Debug, Parser)]
struct Args {
    /// Input CSV file, or a directory of CSV files
    #[clap(short, long, value_parser)]
    input: PathBuf,

    /// The input has no header row
    #[clap(long)]
    no_header: bool,

    /// Calibrate fuzzy values by this column statistic
    #[clap(short, long, value_enum)]
    calibrate: Option<Calibration>,

    /// Weights of literal frequency, degree, betweenness and sub-degree
    #[clap(short, long, value_parser, multiple_values = true)]
    weights: Vec<f64>,

    /// Scores are snapped to multiples of this value
    #[clap(short, long, value_parser)]
    resolution: Option<f64>,

    /// Fraction of co-occurrence pairs kept as graph edges
    #[clap(short, long, value_parser)]
    density: Option<f64>,

    /// Covering heuristic
    #[clap(long, value_enum, default_value = "wlwo")]
    cover: Cover,

    /// Output JSON report
    #[clap(short, long, value_parser)]
    output: Option<PathBuf>,

    /// Print the found terms as a tree
    #[clap(long)]
    tree: bool,

    /// Write the co-occurrence graphs as Graphviz files into this directory
    #[clap(long, value_parser)]
    dot_dir: Option<PathBuf>,

    /// Number of threads
    #[clap(short = 't', long)]
    num_threads: Option<usize>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Calibration {
    Mean,
    Median,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Cover {
    /// Weighted literals, weighted outputs
    Wlwo,
    /// Least covered, most covering
    #[clap(alias("least-covered"))]
    Lcmc,
}

impl Args {
    fn params(&self) -> Result<Params> {
        let mut params = Params::default();
        if !self.weights.is_empty() {
            params.weights = Weights::from_slice(&self.weights)?;
        }
        if let Some(resolution) = self.resolution {
            params.resolution = resolution;
        }
        if let Some(density) = self.density {
            params.density = density;
        }
        params.cover = match self.cover {
            Cover::Wlwo => CoverStrategy::Wlwo,
            Cover::Lcmc => CoverStrategy::Lcmc,
        };
        params.validate()?;
        Ok(params)
    }

    fn load(&self) -> Result<Vec<Table>> {
        let header = !self.no_header;
        if self.input.is_dir() {
            Table::load_dir(&self.input, header)
        } else {
            let name = self
                .input
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            let table = Table::load(name, &self.input, header)
                .with_context(|| format!("failed to load {}", self.input.display()))?;
            Ok(vec![table])
        }
    }
}

fn prepare(
    mut table: Table,
    calibration: Option<Calibration>,
    sink: &dyn LogSink,
) -> Result<Dataset> {
    let stat = match calibration {
        Some(Calibration::Mean) => Some(Stat::Mean),
        Some(Calibration::Median) => Some(Stat::Median),
        None if !table.is_crisp() => {
            info!("{}: fuzzy values found, calibrating by median", table.name);
            Some(Stat::default())
        }
        None => None,
    };
    if let Some(stat) = stat {
        table.calibrate(stat);
    }
    let (onset, offset) = table.clean(sink);
    if onset + offset > 0 {
        info!(
            "{}: {} onset and {} offset rows removed as conflicts",
            table.name, onset, offset
        );
    }
    let name = table.name.clone();
    table
        .into_dataset()
        .with_context(|| format!("{name}: dataset is not usable"))
}

fn write_dot(dir: &Path, name: &str, dataset: &Dataset, params: &Params) -> Result<()> {
    fs::create_dir_all(dir)?;
    let centralities = Centralities::new(dataset, params.density);
    for (set, graph) in [
        ("onset", centralities.onset_graph()),
        ("offset", centralities.offset_graph()),
    ] {
        let path = dir.join(format!("{name}_{set}.dot"));
        let out = BufWriter::new(File::create(&path)?);
        graph
            .write_dot(out, &format!("{name} {set}"), &dataset.variables)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("graph written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    utils::init_tracing_subscriber("info")?;
    let args = Args::parse();
    info!("args: {:#?}", args);
    utils::setup_rayon(args.num_threads)?;

    let params = args.params()?;
    let sink = TracingSink::default();
    let cancel = CancelToken::new();

    let begin = Instant::now();
    let mut reports = Vec::new();
    for table in args.load()? {
        let name = table.name.clone();
        let dataset = prepare(table, args.calibrate, &sink)?;
        if let Some(dir) = &args.dot_dir {
            write_dot(dir, &name, &dataset, &params)?;
        }

        let analysis = analyse(&dataset, &params, &sink, &cancel)
            .with_context(|| format!("{name}: analysis failed"))?;
        let report = analysis.report(name, &dataset, &params);
        if args.tree {
            ptree::print_tree(&report.tree())?;
        }
        reports.push(report);
    }
    info!("{} datasets analysed in {:?}", reports.len(), begin.elapsed());

    if let Some(output) = &args.output {
        match reports.as_slice() {
            [report] => utils::write_json(output, report)?,
            _ => utils::write_json(output, &reports)?,
        }
        info!("report written to {}", output.display());
    }

    Ok(())
}
