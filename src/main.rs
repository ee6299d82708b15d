//! chatgate - minimal HTTP gateway for LLM chat completions
//!
//! Accepts simplified chat requests on `/api/chat`, injects the server-side
//! model and credential, and relays the upstream completion API's reply.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatgate::config::{load_dotenv, Config, GatewayMode};
use chatgate::proxy::run_server;

#[derive(Parser)]
#[command(name = "chatgate")]
#[command(about = "Minimal HTTP gateway that relays chat requests to an LLM completion API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Override the PORT environment variable
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Validate the environment configuration and print a summary
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before tracing init so RUST_LOG may come from .env
    let dotenv_error = load_dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatgate=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(e) = dotenv_error {
        tracing::warn!(error = %e, "Ignoring unreadable .env file");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = Config::from_env().context("Failed to load configuration")?;

            if let Some(port) = port {
                tracing::info!(port, "Override listen port");
                config.server.port = port;
            }

            run_server(config).await
        }

        Commands::Check => {
            let config = Config::from_env().context("Failed to load configuration")?;
            print_summary(&config);
            Ok(())
        }
    }
}

fn print_summary(config: &Config) {
    println!("Configuration OK");
    println!("  listen:  {}", config.server.listen_addr());
    println!("  schema:  {}", config.schema.as_str());
    println!("  mode:    {}", config.mode.name());

    if let GatewayMode::Proxy(upstream) = &config.mode {
        println!("  uri:     {}", upstream.uri);
        println!("  model:   {}", upstream.model);
        println!("  secret:  {}", upstream.api_key);
        println!(
            "  title:   {}",
            upstream.title.as_deref().unwrap_or("(not set)")
        );
        println!(
            "  referer: {}",
            upstream.referer.as_deref().unwrap_or("(not set)")
        );
        match upstream.timeout {
            Some(timeout) => println!("  timeout: {}s", timeout.as_secs()),
            None => println!("  timeout: none"),
        }
    }
}
