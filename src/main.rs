use clap::Parser;
use eventdeck::cli::{Cli, Commands};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventdeck=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { path, name }) => {
            eventdeck::cli::init::run(path, name).await?;
        }
        Some(Commands::Serve { host, port }) => {
            eventdeck::cli::serve::run(&cli.config, host.as_deref(), port).await?;
        }
        Some(Commands::Migrate) => {
            eventdeck::cli::migrate::run(&cli.config).await?;
        }
        Some(Commands::Check) => {
            eventdeck::cli::check::run(&cli.config).await?;
        }
        Some(Commands::Slug { command }) => {
            eventdeck::cli::slug::run(&cli.config, command)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
        }
    }

    Ok(())
}
