use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use tracematch_compare::{
    ChannelSource, Comparison, ComparisonExecutor, ExecutionMode, SyncProcessor,
};
use tracematch_io::{
    ComparisonSummary, ExperimentName, LoadedMeasurement, MeasurementReader, ResultWriter,
};
use tracematch_metric::{Metric, MetricRegistry};
use tracematch_signal::SignalData;

#[derive(Parser)]
#[command(name = "tracematch")]
#[command(about = "Synchronize and score evaluation signals against a reference measurement")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Worker threads per comparison (defaults to half the logical cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Score channel pairs on the calling thread instead of a worker pool
    #[arg(long, global = true)]
    sequential: bool,
}

/// How sync blocks are derived. Without any option one block spans the
/// longest common duration from the start of both measurements.
#[derive(Args, Debug, Clone)]
struct SyncArgs {
    /// Align on every step change of this piecewise-constant channel
    #[arg(long, conflicts_with = "sync_channel")]
    marker_channel: Option<String>,

    /// Treat the first sample of the marker channel as a marker too
    #[arg(long, default_value_t = false, requires = "marker_channel")]
    use_initial_value: bool,

    /// Align on the first crossing of --sync-value in this channel
    #[arg(long, requires = "sync_value")]
    sync_channel: Option<String>,

    /// Value whose crossing marks the alignment point
    #[arg(long, allow_negative_numbers = true)]
    sync_value: Option<f64>,
}

/// Shared comparison options.
#[derive(Args, Debug, Clone)]
struct CompareArgs {
    /// Path to the reference measurement CSV (`time,<channel>...`)
    #[arg(long)]
    reference: PathBuf,

    /// Registry name of the metric (see `tracematch metrics`)
    #[arg(long, default_value = "ISO")]
    metric: String,

    /// Override an assignment: `REF=EVAL`, or `REF=` to leave REF unassigned
    #[arg(long = "assign", value_name = "REF=EVAL")]
    assignments: Vec<String>,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    #[command(flatten)]
    sync: SyncArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Compare one evaluation measurement against a reference
    Compare {
        /// Path to the evaluation measurement CSV
        #[arg(long)]
        evaluation: PathBuf,

        #[command(flatten)]
        args: CompareArgs,
    },

    /// Compare several evaluation measurements against one reference, one at a time
    Batch {
        /// Paths to the evaluation measurement CSVs
        #[arg(long, num_args = 1.., required = true)]
        evaluations: Vec<PathBuf>,

        #[command(flatten)]
        args: CompareArgs,
    },

    /// List the preconfigured metrics
    Metrics,
}

#[derive(Serialize)]
struct MetricOutput {
    name: &'static str,
    metric: String,
}

#[derive(Serialize)]
struct BatchOutput {
    experiment: String,
    requested: usize,
    completed: usize,
    comparisons: Vec<ComparisonSummary>,
}

fn read_measurement(path: &Path) -> Result<LoadedMeasurement> {
    MeasurementReader::new(path)
        .read()
        .with_context(|| format!("failed to read measurement {}", path.display()))
}

fn lookup_metric(name: &str) -> Result<Metric> {
    let registry = MetricRegistry::default();
    registry.get(name).with_context(|| {
        let known = registry.names().collect::<Vec<_>>().join(", ");
        format!("unknown metric \"{name}\" (expected one of: {known})")
    })
}

fn channel_data(loaded: &LoadedMeasurement, name: &str) -> Result<SignalData> {
    let channel = loaded
        .measurement
        .channel_by_name(name)
        .with_context(|| {
            format!(
                "measurement \"{}\" has no channel \"{name}\"",
                loaded.measurement.name()
            )
        })?;
    Ok(loaded.source.load(&channel.id)?)
}

fn build_comparison(
    reference: &LoadedMeasurement,
    evaluation: &LoadedMeasurement,
    metric: Metric,
    args: &CompareArgs,
) -> Result<Comparison> {
    let mut comparison =
        Comparison::new(reference.measurement.clone(), evaluation.measurement.clone());
    comparison.set_metric(metric);

    for assignment in &args.assignments {
        let (reference_name, evaluation_name) = assignment
            .split_once('=')
            .with_context(|| format!("invalid assignment \"{assignment}\" (expected REF=EVAL)"))?;
        let evaluation_name = Some(evaluation_name).filter(|n| !n.is_empty());
        comparison.assign_channel(reference_name, evaluation_name)?;
    }

    let sync = &args.sync;
    if let Some(marker) = &sync.marker_channel {
        let ref_data = channel_data(reference, marker)?;
        let eval_data = channel_data(evaluation, marker)?;
        let blocks =
            SyncProcessor::sync_multi(&mut comparison, &ref_data, &eval_data, sync.use_initial_value)
                .with_context(|| format!("marker sync on \"{marker}\" failed"))?;
        info!(channel = %marker, blocks, "marker sync applied");
    } else if let (Some(channel), Some(value)) = (&sync.sync_channel, sync.sync_value) {
        let ref_data = channel_data(reference, channel)?;
        let eval_data = channel_data(evaluation, channel)?;
        SyncProcessor::sync(&mut comparison, &ref_data, &eval_data, value, value);
        info!(channel = %channel, value, "crossing sync applied");
    } else {
        SyncProcessor::sync_full(&mut comparison);
    }

    Ok(comparison)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.sequential {
        ExecutionMode::Sequential
    } else {
        ExecutionMode::Parallel {
            threads: cli.threads,
        }
    };
    let executor = ComparisonExecutor::new(mode);
    info!(threads = mode.threads(), ?mode, "executor configured");

    match cli.command {
        Command::Compare { evaluation, args } => {
            let experiment_name = ExperimentName::new(args.experiment.clone())?;
            let metric = lookup_metric(&args.metric)?;

            let reference = read_measurement(&args.reference)?;
            let evaluation = read_measurement(&evaluation)?;
            let comparison = build_comparison(&reference, &evaluation, metric, &args)?;

            let mut source = reference.source;
            source.extend(evaluation.source);

            let result = executor
                .execute(&comparison, &source)
                .with_context(|| format!("comparison \"{}\" failed", comparison.name()))?;

            let summary = ComparisonSummary::from_result(&result);
            let writer = ResultWriter::new(&args.output_dir, experiment_name)?;
            writer.write_comparison(&result)?;
            writer.write_summary(std::slice::from_ref(&summary))?;

            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Batch { evaluations, args } => {
            let experiment_name = ExperimentName::new(args.experiment.clone())?;
            let metric = lookup_metric(&args.metric)?;

            let reference = read_measurement(&args.reference)?;
            let mut source = reference.source.clone();
            let mut comparisons = Vec::with_capacity(evaluations.len());
            for path in &evaluations {
                let evaluation = read_measurement(path)?;
                comparisons.push(build_comparison(&reference, &evaluation, metric, &args)?);
                source.extend(evaluation.source);
            }

            let results = executor.execute_all(&comparisons, &source, |result| {
                info!(
                    comparison = result.name(),
                    average = result.result_average(),
                    "comparison finished"
                );
            });

            let summaries: Vec<_> = results.iter().map(ComparisonSummary::from_result).collect();
            let writer = ResultWriter::new(&args.output_dir, experiment_name)?;
            writer.write_batch(&results)?;
            writer.write_summary(&summaries)?;

            let output = BatchOutput {
                experiment: args.experiment,
                requested: comparisons.len(),
                completed: results.len(),
                comparisons: summaries,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Metrics => {
            let output: Vec<_> = MetricRegistry::default()
                .iter()
                .map(|(name, metric)| MetricOutput {
                    name,
                    metric: metric.to_string(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
