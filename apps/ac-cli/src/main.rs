use std::path::{Path, PathBuf};

use ac_app::{AppError, AppResult, Problem, RunStatus, batch, io_service};
use ac_components::global_registry_mut;
use ac_project::{Config, load_config};
use ac_results::CaseStore;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ac-cli")]
#[command(
    about = "aerocouple CLI - coupled multidisciplinary analysis and optimization",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and assemble its model
    Validate {
        /// Path to the configuration (YAML or JSON)
        config_path: PathBuf,
    },
    /// List registered services and their implementations
    Services,
    /// Write the unconnected inputs of a model to a snapshot file
    NeededInputs {
        config_path: PathBuf,
        /// Take values from this snapshot where names match
        #[arg(long)]
        reference: Option<PathBuf>,
        /// Destination (defaults to the configuration's input_file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate the model once
    Eval {
        config_path: PathBuf,
        /// Input snapshot (defaults to the configuration's input_file)
        #[arg(short, long)]
        inputs: Option<PathBuf>,
        /// Output snapshot (defaults to the configuration's output_file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run the optimization declared in the configuration
    Optimize {
        config_path: PathBuf,
        #[arg(short, long)]
        inputs: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate every case of a case file in parallel
    Batch {
        config_path: PathBuf,
        /// Case file (YAML or JSON)
        cases_path: PathBuf,
        #[arg(short, long)]
        inputs: Option<PathBuf>,
        /// Store the results next to the configuration
        #[arg(long)]
        save: bool,
    },
    /// List stored batches of a configuration
    Batches { config_path: PathBuf },
}

fn main() -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Services => cmd_services(),
        Commands::NeededInputs {
            config_path,
            reference,
            output,
        } => cmd_needed_inputs(&config_path, reference.as_deref(), output),
        Commands::Eval {
            config_path,
            inputs,
            output,
        } => cmd_eval(&config_path, inputs, output),
        Commands::Optimize {
            config_path,
            inputs,
            output,
        } => cmd_optimize(&config_path, inputs, output),
        Commands::Batch {
            config_path,
            cases_path,
            inputs,
            save,
        } => cmd_batch(&config_path, &cases_path, inputs, save),
        Commands::Batches { config_path } => cmd_batches(&config_path),
    }
}

/// Load, assemble and set up; inputs come from `inputs` or the config's `input_file`.
fn prepare(config_path: &Path, inputs: Option<PathBuf>) -> AppResult<(Config, Problem)> {
    let config = load_config(config_path)?;
    info!(config = %config_path.display(), "configuration loaded");
    let mut problem = Problem::from_config(&config, &mut global_registry_mut())?;
    problem.setup()?;
    if let Some(path) = inputs.or_else(|| config.input_file.clone()) {
        let extras = io_service::read_inputs(&mut problem, &path)?;
        if !extras.is_empty() {
            println!("Ignored {} entries of {}", extras.len(), path.display());
        }
    }
    Ok((config, problem))
}

fn cmd_validate(config_path: &Path) -> AppResult<()> {
    println!("Validating configuration: {}", config_path.display());
    let config = load_config(config_path)?;
    let mut problem = Problem::from_config(&config, &mut global_registry_mut())?;
    problem.setup()?;
    let report = problem.unconnected()?;
    println!(
        "✓ Configuration is valid: {} components, {} variables",
        problem.system().leaves().len(),
        problem.variables()?.len()
    );
    println!(
        "  {} mandatory and {} optional unconnected inputs",
        report.mandatory.len(),
        report.optional.len()
    );
    Ok(())
}

fn cmd_services() -> AppResult<()> {
    let mut registry = global_registry_mut();
    let services = registry.services();
    if services.is_empty() {
        println!("No services registered");
    }
    for service in services {
        println!("{service}");
        let ids: Vec<String> = registry
            .get_implementations(&service)
            .map(str::to_string)
            .collect();
        for id in ids {
            let Some(desc) = registry.descriptor(&service, &id) else {
                continue;
            };
            let marker = if desc.properties.default { " (default)" } else { "" };
            let text = desc.properties.description.as_deref().unwrap_or("");
            println!("  {id}{marker}  {text}");
        }
    }
    for skipped in registry.unavailable() {
        println!("! unavailable: {} ({})", skipped.plugin, skipped.reason);
    }
    Ok(())
}

fn cmd_needed_inputs(
    config_path: &Path,
    reference: Option<&Path>,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let config = load_config(config_path)?;
    let path = output.or_else(|| config.input_file.clone()).ok_or_else(|| {
        AppError::ConfigurationAssembly {
            path: "input_file".to_string(),
            reason: "no input_file in the configuration and no --output given".to_string(),
        }
    })?;
    let mut problem = Problem::from_config(&config, &mut global_registry_mut())?;
    problem.setup()?;
    let snapshot = io_service::write_needed_inputs(&problem, &path, reference)?;
    println!("✓ {} inputs written to {}", snapshot.len(), path.display());
    Ok(())
}

fn write_results(problem: &Problem, config: &Config, output: Option<PathBuf>) -> AppResult<()> {
    match output.or_else(|| config.output_file.clone()) {
        Some(path) => {
            let snapshot = io_service::write_outputs(problem, &path)?;
            println!("  {} variables written to {}", snapshot.len(), path.display());
        }
        None => {
            for var in problem.variables()? {
                let units = var.units.as_deref().unwrap_or("");
                println!("  {} = {} {units}", var.name, var.value);
            }
        }
    }
    Ok(())
}

fn cmd_eval(config_path: &Path, inputs: Option<PathBuf>, output: Option<PathBuf>) -> AppResult<()> {
    let (config, mut problem) = prepare(config_path, inputs)?;
    let status = problem.run_model()?;
    for group in problem.reports() {
        println!("  {}: {}", group.group, group.report);
    }
    match &status {
        RunStatus::Converged => println!("✓ Model converged"),
        RunStatus::Failed(failure) => println!("✗ Group '{}' did not converge", failure.group),
    }
    write_results(&problem, &config, output)?;
    status.into_result()
}

fn cmd_optimize(
    config_path: &Path,
    inputs: Option<PathBuf>,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let (config, mut problem) = prepare(config_path, inputs)?;
    let result = problem.run_driver()?;
    println!("{result}");
    write_results(&problem, &config, output)
}

fn cmd_batch(
    config_path: &Path,
    cases_path: &Path,
    inputs: Option<PathBuf>,
    save: bool,
) -> AppResult<()> {
    let (config, problem) = prepare(config_path, inputs)?;
    let cases = batch::load_cases(cases_path)?;
    let report = batch::run_batch(&problem, &cases)?;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(_) => println!("  ✓ {}", outcome.id),
            Err(reason) => println!("  ✗ {}: {reason}", outcome.id),
        }
    }
    println!("{report}");
    if save {
        let store = CaseStore::for_config(config_path)?;
        let manifest = batch::save_batch(&store, &config, &cases, &report)?;
        println!("✓ Batch saved: {}", manifest.batch_id);
    }
    Ok(())
}

fn cmd_batches(config_path: &Path) -> AppResult<()> {
    let config = load_config(config_path)?;
    let store = CaseStore::for_config(config_path)?;
    let manifests = store.list_batches(&ac_results::config_hash(&config)?)?;
    if manifests.is_empty() {
        println!("No stored batches for {}", config_path.display());
    }
    for manifest in manifests {
        println!(
            "  {} ({}) {} cases, {} failed",
            manifest.batch_id, manifest.timestamp, manifest.case_count, manifest.failed_count
        );
    }
    Ok(())
}
