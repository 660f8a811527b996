use clap::{Parser, Subcommand};
use devbox_bootstrap::config::{loader, validator, BootstrapConfig};
use devbox_bootstrap::orchestrator::{Pipeline, ProvisionContext, Toolbox};
use devbox_bootstrap::state_store::FileStateStore;
use devbox_bootstrap::system::health::HealthManager;
use devbox_bootstrap::{LogCollector, ProvisionError};
use log::LevelFilter;
use std::path::PathBuf;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "devbox_bootstrap", version, about = "Provision a local director next to the dev VM")]
struct Cli {
    /// TOML config file (default: per-user config if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Working root for caches, logs and checkouts
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Log every command and its output
    #[arg(
        long,
        global = true,
        env = "TRACE",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    trace: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the full provisioning pipeline (default)
    Up,
    /// Report which provisioning markers are present
    Status {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the environment profile path and contents
    Env,
}

fn load_config(cli: &Cli) -> Result<BootstrapConfig, ProvisionError> {
    let mut config = loader::load_or_default(cli.config.as_deref())?;
    if let Some(root) = &cli.root {
        config.workspace.root = root.clone();
    }
    validator::validate_config(&config)?;
    Ok(config)
}

fn fatal(e: &ProvisionError) -> i32 {
    log::error!("✗ FATAL: {}", e);
    e.exit_code()
}

async fn run_up(config: BootstrapConfig) -> Result<PathBuf, ProvisionError> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("[Main] Interrupt received, stopping after the current step");
            let _ = cancel_tx.send(true);
        }
    });

    let tools = Toolbox::production(&config);
    let mut ctx = ProvisionContext::new(config, tools);
    let pipeline = Pipeline::standard(cancel_rx);
    pipeline.run(&mut ctx).await?;
    Ok(ctx.profile_path())
}

fn run_status(config: &BootstrapConfig, json: bool) -> Result<(), ProvisionError> {
    let paths = config.workspace_paths();
    let report = HealthManager::check(config, &paths, &FileStateStore::new());
    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| ProvisionError::Pipeline(format!("serializing status: {}", e)))?;
        println!("{}", out);
    } else {
        print!("{}", report.render());
        if report.status.needs_run() {
            println!("Run `devbox_bootstrap up` to provision.");
        }
    }
    Ok(())
}

fn run_env(config: &BootstrapConfig) -> Result<(), ProvisionError> {
    let paths = config.workspace_paths();
    let profile_path = config.profile_path(&config.checkout_dir(&paths));
    let content = std::fs::read_to_string(&profile_path).map_err(|e| {
        ProvisionError::Credentials(format!(
            "no profile at {} ({}); run `devbox_bootstrap up` first",
            profile_path.display(),
            e
        ))
    })?;
    println!("# {}", profile_path.display());
    print!("{}", content);
    Ok(())
}

/// Install the session file logger. Only `up` writes a log file.
fn start_logging(config: &BootstrapConfig, level: LevelFilter) -> Option<LogCollector> {
    let paths = config.workspace_paths();
    let collector = match LogCollector::new(config.log_dir(&paths), level, level) {
        Ok(collector) => collector,
        Err(e) => {
            eprintln!("✗ FATAL: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = collector.install() {
        eprintln!("[Main] WARNING: {}", e);
    }
    log::debug!("[Main] Logging to {}", collector.session_log_path().display());
    Some(collector)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level = if cli.trace {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ FATAL: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let command = cli.command.unwrap_or(Command::Up);
    let collector = match command {
        Command::Up => start_logging(&config, level),
        Command::Status { .. } | Command::Env => None,
    };

    let result = match command {
        Command::Up => run_up(config).await.map(|profile| {
            log::info!("✓ Director ready. Environment profile: {}", profile.display());
            log::info!("  source {}", profile.display());
            log::info!("  bosh env");
        }),
        Command::Status { json } => run_status(&config, json),
        Command::Env => run_env(&config),
    };

    let code = match result {
        Ok(()) => 0,
        Err(e) if collector.is_some() => fatal(&e),
        Err(e) => {
            eprintln!("✗ FATAL: {}", e);
            e.exit_code()
        }
    };

    if let Some(collector) = collector {
        let _ = collector.wait_for_empty().await;
    }
    std::process::exit(code);
}
