//! `hardgate` CLI: run one scan against a local path, or boot the HTTP
//! surface over the asynchronous Scan Service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;

use hardgate_core::adapters::{FilesystemReportStore, JsonReportRenderer, LocalPathFetcher};
use hardgate_core::core::config::Settings;
use hardgate_core::core::orchestrator::run_validation;
use hardgate_core::http::{router, AppState};
use hardgate_core::lang::detector::file_extension_inventory;
use hardgate_core::llm::{DeadlineBoundedHook, NoopEnhancementHook};
use hardgate_core::scan::ScanService;

mod cli;

#[derive(Parser)]
#[command(name = "hardgate", version, about = "Hard-gate engineering-practice validator")]
struct Cli {
    /// Emit debug-level logs instead of info-level.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one scan against a local directory and print the result.
    Scan(ScanArgs),
    /// Boot the HTTP surface over a concurrency-bounded Scan Service.
    Serve(ServeArgs),
    /// Print the effective configuration (defaults layered with a file and
    /// environment overrides) as YAML.
    PrintConfig {
        /// Optional configuration file to layer on top of the defaults.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Parser)]
struct ScanArgs {
    /// Directory to scan.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Optional configuration file layered on top of the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "pretty")]
    format: OutputFormat,

    /// Print the file-extension inventory alongside the gate report.
    #[arg(long)]
    stats: bool,
}

#[derive(Parser)]
struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Optional configuration file layered on top of the defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory rendered reports are persisted to.
    #[arg(long, default_value = "./hardgate-reports")]
    reports_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_max_level(log_level).with_target(false).init();

    match cli.command {
        Commands::Scan(args) => run_scan(args).await,
        Commands::Serve(args) => run_serve(args).await,
        Commands::PrintConfig { config } => print_config(config),
    }
}

async fn run_scan(args: ScanArgs) -> anyhow::Result<()> {
    let mut settings = Settings::from_layered(args.config.as_deref())?;
    settings.root_path = args.path.clone();
    settings.validate()?;

    if !args.path.is_dir() {
        anyhow::bail!("'{}' is not a directory", args.path.display());
    }

    let hook = NoopEnhancementHook;
    let cancellation = CancellationToken::new();
    let result = run_validation(&args.path, &settings, &hook, &cancellation).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Pretty => cli::print_validation_result(&result),
    }

    if args.stats {
        let inventory = file_extension_inventory(&args.path)?;
        cli::print_extension_inventory(&inventory);
    }

    Ok(())
}

async fn run_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut settings = Settings::from_layered(args.config.as_deref())?;
    settings.validate()?;
    let llm_deadline = Duration::from_secs(settings.llm_deadline_secs);

    let service = ScanService::new(
        settings,
        Arc::new(LocalPathFetcher),
        Arc::new(DeadlineBoundedHook::new(NoopEnhancementHook, llm_deadline)),
        Arc::new(JsonReportRenderer),
        Arc::new(FilesystemReportStore::new(args.reports_dir)),
    );

    let app = router(AppState { scan_service: service });
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    tracing::info!(%addr, "starting hardgate HTTP surface");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn print_config(config: Option<PathBuf>) -> anyhow::Result<()> {
    let settings = Settings::from_layered(config.as_deref())?;
    println!("{}", serde_yaml::to_string(&settings)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_defaults_to_current_directory() {
        let cli = Cli::parse_from(["hardgate", "scan"]);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.path, PathBuf::from("."));
                assert!(!args.stats);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn scan_accepts_json_format_and_stats_flag() {
        let cli = Cli::parse_from(["hardgate", "scan", "--format", "json", "--stats", "src"]);
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(args.path, PathBuf::from("src"));
                assert!(args.stats);
                assert!(matches!(args.format, OutputFormat::Json));
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn serve_defaults_to_loopback_on_8080() {
        let cli = Cli::parse_from(["hardgate", "serve"]);
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host, "127.0.0.1");
                assert_eq!(args.port, 8080);
            }
            _ => panic!("expected Serve command"),
        }
    }

    #[test]
    fn print_config_accepts_optional_file() {
        let cli = Cli::parse_from(["hardgate", "print-config"]);
        match cli.command {
            Commands::PrintConfig { config } => assert_eq!(config, None),
            _ => panic!("expected PrintConfig command"),
        }
    }
}
