use crate::infra::open_repositories;
use crate::server;
use clap::{Args, Parser, Subcommand};
use estate_hub::clock::SystemClock;
use estate_hub::config::AppConfig;
use estate_hub::error::AppError;
use estate_hub::subscriptions::SubscriptionService;
use estate_hub::telemetry;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "Estate Hub",
    about = "Serve the real-estate marketplace API or run its maintenance jobs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Subscription maintenance
    Subscriptions {
        #[command(subcommand)]
        command: SubscriptionCommand,
    },
}

#[derive(Subcommand, Debug)]
enum SubscriptionCommand {
    /// Renew or deactivate every subscription past its end date, once
    Sweep(SweepArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SweepArgs {
    /// Override the configured SQLite database path
    #[arg(long)]
    pub(crate) database: Option<String>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Subscriptions {
            command: SubscriptionCommand::Sweep(args),
        } => run_sweep(args),
    }
}

fn run_sweep(args: SweepArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = args.database {
        config.database.path = path;
    }
    telemetry::init(&config.telemetry)?;

    let repositories = open_repositories(&config.database)?;
    let service = SubscriptionService::new(&repositories, Arc::new(SystemClock));
    let report = service.process_expired()?;

    println!("Subscription sweep complete");
    println!("  renewed:     {}", report.renewed);
    println!("  deactivated: {}", report.deactivated);
    if report.failed > 0 {
        println!("  failed:      {}", report.failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["estate-hub-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_sweep_with_database_override() {
        let cli = Cli::try_parse_from([
            "estate-hub-api",
            "subscriptions",
            "sweep",
            "--database",
            "/tmp/hub.db",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Subscriptions {
                command: SubscriptionCommand::Sweep(args),
            }) => assert_eq!(args.database.as_deref(), Some("/tmp/hub.db")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn serve_accepts_overrides() {
        let cli = Cli::try_parse_from(["estate-hub-api", "serve", "--port", "9090"])
            .expect("parses");
        match cli.command {
            Some(Command::Serve(args)) => {
                assert_eq!(args.port, Some(9090));
                assert!(args.host.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
