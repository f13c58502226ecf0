//! histcfg CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use hc_config::presets::{plot_tuple, plot_tuple_options};
use hc_config::{JobConfig, JobFile};

#[derive(Parser)]
#[command(name = "histcfg")]
#[command(about = "histcfg - Histogram job configuration for analyzer pipelines")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the built-in plot-tuple job (mu-tau and e-tau histograms)
    PlotTuple {
        /// Job options as key=value (inputFiles, outputFile, maxEvents, skipEvents, ewkSkim)
        args: Vec<String>,

        /// Output file for the job (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a job file (YAML or JSON)
    Render {
        /// Job file
        #[arg(short, long)]
        config: PathBuf,

        /// Job options as key=value, overriding the file's defaults
        args: Vec<String>,

        /// Output file for the job (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a job file without rendering it
    Validate {
        /// Job file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List the resolved templates of a job file
    Templates {
        /// Job file
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::PlotTuple { args, output } => cmd_plot_tuple(&args, output.as_ref()),
        Commands::Render { config, args, output } => cmd_render(&config, &args, output.as_ref()),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Templates { config, output } => cmd_templates(&config, output.as_ref()),
    }
}

fn cmd_plot_tuple(args: &[String], output: Option<&PathBuf>) -> Result<()> {
    let mut options = plot_tuple_options();
    options.parse_arguments(args)?;
    let job = plot_tuple(&options)?;
    write_job(&job, output)
}

fn cmd_render(config: &Path, args: &[String], output: Option<&PathBuf>) -> Result<()> {
    let job = load_job(config, args)?;
    write_job(&job, output)
}

fn cmd_validate(config: &Path) -> Result<()> {
    let job = load_job(config, &[])?;
    println!(
        "ok: process {} with {} analyzer(s), {} histogram(s), path {} = {}",
        job.process,
        job.analyzers.len(),
        job.n_histograms(),
        job.path.name,
        job.path.sequence.join("*")
    );
    Ok(())
}

fn cmd_templates(config: &Path, output: Option<&PathBuf>) -> Result<()> {
    let file = JobFile::from_path(config)
        .with_context(|| format!("loading job file {}", config.display()))?;
    let store = file.resolve_templates()?;
    let listing: serde_json::Map<String, serde_json::Value> = store
        .iter()
        .map(|(key, d)| -> Result<(String, serde_json::Value)> {
            Ok((key.to_string(), serde_json::to_value(d)?))
        })
        .collect::<Result<_>>()?;
    write_json(&serde_json::to_string_pretty(&listing)?, output)
}

fn load_job(config: &Path, args: &[String]) -> Result<JobConfig> {
    let file = JobFile::from_path(config)
        .with_context(|| format!("loading job file {}", config.display()))?;
    let mut options = file.default_options();
    options.parse_arguments(args)?;
    let job = file.build(&options).with_context(|| format!("building job {}", config.display()))?;
    Ok(job)
}

fn write_job(job: &JobConfig, output: Option<&PathBuf>) -> Result<()> {
    write_json(&job.to_json_pretty()?, output)
}

fn write_json(json: &str, output: Option<&PathBuf>) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote job");
    } else {
        println!("{json}");
    }
    Ok(())
}
