use clap::{Parser, Subcommand};
use fire_advisor::api::{ServeArgs, build_config, run_http_server};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fire-advisor",
    about = "Ranked retirement advice and scenario comparison over projected household finances"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the advice and comparison HTTP API
    Serve(ServeArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("FIRE_ADVISOR_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            let config = match build_config(&args) {
                Ok(config) => config,
                Err(msg) => {
                    eprintln!("{msg}");
                    std::process::exit(2);
                }
            };
            if let Err(e) = run_http_server(args.port, config).await {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
    }
}
