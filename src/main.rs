mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adpulse::AdPulseError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = adpulse::Config::load(cli.config.as_deref())?;
    let pretty = cli.pretty;

    let result =
        cli::commands::dispatch(&config, cli.config.as_deref(), cli.command, pretty).await;

    match result {
        Err(err) if !pretty => {
            let code = err
                .chain()
                .find_map(|e| e.downcast_ref::<AdPulseError>())
                .map(AdPulseError::code)
                .unwrap_or("ERROR");
            println!(
                "{}",
                serde_json::json!({ "error": { "code": code, "message": format!("{:#}", err) } })
            );
            std::process::exit(1);
        }
        other => other,
    }
}
