//! EvoTherapy CLI
//!
//! Compare dosing policies on the mean-field and spatial tumor models.

use clap::Parser;
use evotherapy_sim::{
    Engine, ExperimentExport, ExperimentRunner, ExperimentSettings, PolicyId, RunSummary, SimError,
};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// EvoTherapy policy comparison CLI
#[derive(Parser, Debug)]
#[command(name = "evotherapy-sim")]
#[command(about = "Compare tumor dosing policies on evolutionary game models", long_about = None)]
struct Args {
    /// Master seed for the spatial engine (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Engine to run (mean-field, spatial, both)
    #[arg(short, long, default_value = "both")]
    engine: String,

    /// Policy to run (mtd, metronomic, adaptive, stackelberg, all)
    #[arg(short, long, default_value = "all")]
    policy: String,

    /// JSON settings file; missing fields use defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Override the number of spatial steps
    #[arg(long)]
    steps: Option<usize>,

    /// Override the spatial toxicity limit
    #[arg(long)]
    tox_limit: Option<f64>,

    /// Override the spatial grid side length
    #[arg(long)]
    grid_size: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for scripting
    #[arg(long)]
    json: bool,

    /// Export time series and snapshots to a JSON file for plotting
    #[arg(long)]
    export: Option<String>,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("EvoTherapy Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // Parse engines and policies
    let engines: Vec<Engine> = if args.engine == "both" {
        Engine::all()
    } else {
        vec![args.engine.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available engines: mean-field, spatial, both");
            std::process::exit(1);
        })]
    };

    let policies: Vec<PolicyId> = if args.policy == "all" {
        PolicyId::all()
    } else {
        vec![args.policy.parse().unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            eprintln!("Available policies: mtd, metronomic, adaptive, stackelberg, all");
            std::process::exit(1);
        })]
    };

    let settings = match load_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid settings: {}", e);
            std::process::exit(1);
        }
    };

    // Determine base seed
    let seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };

    let runner = ExperimentRunner::new(seed).with_settings(settings.clone());
    let mut export = ExperimentExport::new(seed, settings);
    let mut summaries: Vec<RunSummary> = Vec::new();
    let mut failed_count = 0;

    for engine in &engines {
        if !args.json {
            info!("━━━ {} engine ━━━", engine);
        }
        for policy in &policies {
            match run_one(&runner, *engine, *policy, &mut export) {
                Ok(summary) => {
                    if !args.json {
                        if summary.survived {
                            info!("✓ {}", summary);
                        } else {
                            warn!("✗ {}", summary);
                        }
                    }
                    summaries.push(summary);
                }
                Err(e) => {
                    failed_count += 1;
                    error!("✗ {} on {} failed: {}", policy.label(), engine, e);
                }
            }
        }
    }

    if let Some(path) = &args.export {
        match export.write_to_file(path) {
            Ok(()) => info!("Exported {} run(s) to {}", export.summaries.len(), path),
            Err(e) => {
                error!("Failed to write export: {}", e);
                failed_count += 1;
            }
        }
    }

    // Summary
    if args.json {
        let summary = serde_json::json!({
            "seed": seed,
            "total": summaries.len() + failed_count,
            "failed": failed_count,
            "results": summaries,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!(
            "Results: {} completed, {} failed (seed={})",
            summaries.len(),
            failed_count,
            seed
        );
    }

    if failed_count > 0 {
        std::process::exit(1);
    }
}

/// Loads the settings file (if any) and applies command-line overrides.
fn load_settings(args: &Args) -> Result<ExperimentSettings, SimError> {
    let mut settings = match &args.config {
        Some(path) => ExperimentSettings::load(path)?,
        None => ExperimentSettings::default(),
    };

    if let Some(steps) = args.steps {
        settings.spatial.time_steps = steps;
    }
    if let Some(limit) = args.tox_limit {
        settings.spatial.toxicity_limit = limit;
    }
    if let Some(size) = args.grid_size {
        settings.spatial.grid_size = size;
    }

    settings.validate()?;
    Ok(settings)
}

/// Runs one policy on one engine, recording it in the export.
fn run_one(
    runner: &ExperimentRunner,
    engine: Engine,
    policy: PolicyId,
    export: &mut ExperimentExport,
) -> Result<RunSummary, SimError> {
    match engine {
        Engine::MeanField => {
            let result = runner.run_mean_field(policy)?;
            let summary = RunSummary::from_mean_field(policy, &result);
            export.add_mean_field(summary.clone(), result);
            Ok(summary)
        }
        Engine::Spatial => {
            let result = runner.run_spatial(policy)?;
            let summary = RunSummary::from_spatial(policy, &result);
            export.add_spatial(summary.clone(), &result);
            Ok(summary)
        }
    }
}
