mod cli;
mod config;
mod panel;
mod worker;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sbx")]
#[command(about = "A command-line control panel for a seedbox media stack")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/sbx/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: cli::Command,
}

/// Log to a file under the data directory so stdout stays clean JSON.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = config::Config::data_dir()?.join("logs");
  std::fs::create_dir_all(&log_dir)?;

  let appender = tracing_appender::rolling::daily(log_dir, "sbx.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = init_tracing()?;

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;

  cli::run(args.command, &config).await
}
