mod config;

use std::fmt;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use dupmap_core::{ClusterEngine, ClusterStats, Clustering, ReportSink};
use dupmap_io::writer::contradiction_summary;
use dupmap_io::{write_summary_json, FileReportSink, InputOptions, RecordReader};

#[derive(Parser)]
#[command(
    name = "dupmap",
    version,
    about = "Group duplicate-question pairs into sets and log label contradictions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Delimited file of labelled pairs
    input: PathBuf,

    /// Field delimiter (default from config, else ',')
    #[arg(short, long)]
    delimiter: Option<char>,

    /// Input has no header row; use the fixed id,qid1,qid2,question1,question2,is_duplicate layout
    #[arg(long)]
    no_header: bool,

    /// How to interpret id fields
    #[arg(long, default_value = "int")]
    ids: IdKind,

    /// Print stats as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster the input and write the cluster and contradiction reports
    Cluster {
        #[command(flatten)]
        input: InputArgs,

        /// Cluster report path
        #[arg(long)]
        clusters: Option<PathBuf>,

        /// Contradiction report path
        #[arg(long)]
        contradictions: Option<PathBuf>,

        /// Also write stats to this JSON file
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Cluster the input and print stats without writing reports
    Check {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show the active configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum IdKind {
    /// Signed 64-bit integers
    Int,
    /// Arbitrary text
    Text,
}

/// Report destinations for a `cluster` run.
struct Outputs {
    clusters: PathBuf,
    contradictions: PathBuf,
    summary_json: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    input: &'a Path,
    #[serde(flatten)]
    stats: &'a ClusterStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    clusters_path: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contradictions_path: Option<&'a Path>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cluster {
            input,
            clusters,
            contradictions,
            summary_json,
        } => {
            let cfg = config::load_config()?;
            let outputs = Outputs {
                clusters: clusters.unwrap_or(cfg.output.clusters_path),
                contradictions: contradictions.unwrap_or(cfg.output.contradictions_path),
                summary_json: summary_json.or(cfg.output.summary_json),
            };
            let options = input_options(cfg.input, &input);
            match input.ids {
                IdKind::Int => cmd_cluster::<i64>(&input, &options, Some(&outputs)),
                IdKind::Text => cmd_cluster::<String>(&input, &options, Some(&outputs)),
            }
        }
        Commands::Check { input } => {
            let cfg = config::load_config()?;
            let options = input_options(cfg.input, &input);
            match input.ids {
                IdKind::Int => cmd_cluster::<i64>(&input, &options, None),
                IdKind::Text => cmd_cluster::<String>(&input, &options, None),
            }
        }
        Commands::Config => cmd_config(),
    }
}

/// Config values overridden by command-line flags.
fn input_options(mut options: InputOptions, args: &InputArgs) -> InputOptions {
    if let Some(d) = args.delimiter {
        options.delimiter = d;
    }
    if args.no_header {
        options.has_header = false;
    }
    options
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_cluster<K>(args: &InputArgs, options: &InputOptions, outputs: Option<&Outputs>) -> Result<()>
where
    K: FromStr + fmt::Display + fmt::Debug + Clone + Eq + Hash + Ord,
{
    let start = Instant::now();
    let path = args.input.as_path();

    let result = cluster_file::<K>(path, options)?;
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        records = result.stats.records,
        "processed input"
    );

    if let Some(out) = outputs {
        let mut sink = FileReportSink::new(&out.clusters, &out.contradictions);
        sink.write_report(&result).context("writing reports")?;
        if let Some(summary) = &out.summary_json {
            write_summary_json(summary, &result.stats).context("writing summary")?;
        }
    }

    let summary = RunSummary {
        input: path,
        stats: &result.stats,
        clusters_path: outputs.map(|o| o.clusters.as_path()),
        contradictions_path: outputs.map(|o| o.contradictions.as_path()),
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn cluster_file<K>(path: &Path, options: &InputOptions) -> Result<Clustering<K>>
where
    K: FromStr + fmt::Debug + Clone + Eq + Hash + Ord,
{
    let reader = RecordReader::<K, _>::open(path, options)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut engine = ClusterEngine::new();
    engine
        .ingest(reader)
        .with_context(|| format!("processing {}", path.display()))?;
    Ok(engine.finalize())
}

fn print_summary(summary: &RunSummary<'_>) {
    let stats = summary.stats;
    println!(
        "Processed {} records ({} duplicate, {} not duplicate)",
        stats.records, stats.duplicate_records, stats.not_duplicate_records
    );
    println!(
        "{} ids in {} clusters ({} singletons, largest {}, {} merges)",
        stats.ids, stats.clusters, stats.singletons, stats.largest_cluster, stats.merges
    );
    if let Some(p) = summary.clusters_path {
        println!("Output saved to {}", p.display());
    }
    println!("{}", contradiction_summary(stats.contradictions));
    if let Some(p) = summary.contradictions_path {
        println!("Contradictions saved to {}", p.display());
    }
}

fn cmd_config() -> Result<()> {
    let cfg = config::load_config()?;
    println!("Config: {}", config::show_config_path());
    println!();
    println!("[input]");
    println!("  delimiter = {:?}", cfg.input.delimiter);
    println!("  has_header = {}", cfg.input.has_header);
    println!();
    println!("[input.columns]");
    let columns = &cfg.input.columns;
    println!("  id_a = {}", columns.id_a);
    println!("  id_b = {}", columns.id_b);
    println!("  label = {}", columns.label);
    println!("  text_a = {}", columns.text_a.as_deref().unwrap_or("(none)"));
    println!("  text_b = {}", columns.text_b.as_deref().unwrap_or("(none)"));
    println!();
    println!("[output]");
    println!("  clusters_path = {}", cfg.output.clusters_path.display());
    println!(
        "  contradictions_path = {}",
        cfg.output.contradictions_path.display()
    );
    if let Some(ref p) = cfg.output.summary_json {
        println!("  summary_json = {}", p.display());
    }
    Ok(())
}
