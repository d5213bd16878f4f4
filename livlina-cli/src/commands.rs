use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use livlina_config::LivlinaConfig;
use livlina_engine::{build_service, IntakeService};
use livlina_telemetry::EventLogger;
use tokio::io::{AsyncWriteExt, BufReader};
use tracing::info;

use crate::error::CliError;
use crate::replay::{parse_script, replay};
use crate::wizard::Wizard;

#[derive(Parser)]
#[command(version, about = "Emergency intake wizard with alert dispatch")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk a reporter through the intake flow on this terminal
    Run(RunArgs),
    /// Drive one session through a YAML script of actions
    Replay(ReplayArgs),
    /// Load and validate the configuration, then print it with secrets hidden
    CheckConfig(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file; defaults to config/livlina.yaml plus environment
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Write alerts to the log instead of sending them
    #[arg(long)]
    pub dry_run: bool,
    /// Print Prometheus metrics on exit
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Script file (YAML list of actions)
    pub script: PathBuf,
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Write alerts to the log instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

impl ConfigArgs {
    fn load(&self) -> Result<LivlinaConfig, CliError> {
        let config = match &self.config {
            Some(path) => LivlinaConfig::load_from_path(path)?,
            None => LivlinaConfig::load()?,
        };
        Ok(config)
    }
}

pub async fn run_command(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run(args) => run_interactive(args).await,
        Commands::Replay(args) => run_replay(args).await,
        Commands::CheckConfig(args) => check_config(args).await,
    }
}

async fn run_interactive(args: RunArgs) -> Result<(), CliError> {
    let config = args.config.load()?;
    EventLogger::init(&config.telemetry.log_filter);
    let service = Arc::new(build_service(&config, args.dry_run)?);
    let sweeper = service.clone().spawn_idle_sweeper();

    let mut wizard = Wizard::new(
        &service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    );
    let view = wizard.run().await;
    sweeper.abort();
    if let Some(view) = view? {
        info!(step = %view.step, outcome = ?view.dispatch_outcome, "Session finished");
    }

    if args.metrics || config.telemetry.metrics {
        print_metrics(&service).await?;
    }
    Ok(())
}

async fn run_replay(args: ReplayArgs) -> Result<(), CliError> {
    let config = args.config.load()?;
    EventLogger::init(&config.telemetry.log_filter);
    let service = build_service(&config, args.dry_run)?;

    let text = tokio::fs::read_to_string(&args.script).await?;
    let actions = parse_script(&text)?;
    let base_dir = args.script.parent().unwrap_or(Path::new("."));

    let mut stdout = tokio::io::stdout();
    let summary = replay(&service, &actions, base_dir, &mut stdout).await?;
    info!(
        final_step = %summary.final_step,
        rejected = summary.rejected,
        "Replay finished"
    );

    if config.telemetry.metrics {
        print_metrics(&service).await?;
    }
    Ok(())
}

async fn check_config(args: ConfigArgs) -> Result<(), CliError> {
    let config = args.load()?;
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(config.to_redacted_yaml()?.as_bytes())
        .await?;

    let note = match config.channel.credentials() {
        Ok(_) => "# channel credentials: present\n".to_string(),
        Err(e) => format!("# channel credentials: {e} (only --dry-run will work)\n"),
    };
    stdout.write_all(note.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

async fn print_metrics(service: &IntakeService) -> Result<(), CliError> {
    let text = service.metrics().gather_metrics()?;
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
