use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "shelf", version, about = "Book catalogue server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
        /// Override the configured database endpoint
        #[arg(long)]
        database: Option<String>,
    },
    /// Print the effective settings as JSON
    Settings,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().with_context(|| "failed to load shelf settings")?;

    match cli.command {
        Command::Settings => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            Ok(())
        }
        Command::Serve { port, database } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            if let Some(endpoint) = database {
                settings.database.endpoint = endpoint;
            }

            shelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "shelf serve");

            let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
            runtime.block_on(shelf_app::run(settings))
        }
    }
}
