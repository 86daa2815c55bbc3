//! DIPTO Daemon - Replication engine host
//!
//! The DIPTO daemon provides:
//! - Live replicas of the site configuration and the course catalog
//! - First-run seeding of an empty document store
//! - Identity tracking and the privileged/public view mode
//! - A REST API for the render layer
//! - One-shot course description drafts from the copywriter

use clap::{Parser, Subcommand};
use dipto_copywriter::{DescriptionWriter, GeminiWriter};
use dipto_daemon::{DaemonConfig, DaemonResult, Server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DIPTO Daemon CLI
#[derive(Parser)]
#[command(name = "diptod")]
#[command(about = "DIPTO Daemon - Replication engine host", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DIPTO_CONFIG")]
    config: Option<String>,

    /// Log level, overrides the configuration file
    #[arg(long, env = "DIPTO_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "DIPTO_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the replica host and REST API until interrupted (default)
    Run,

    /// Draft a course description once and print it
    Describe {
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "Development")]
        category: String,
    },
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    let mut config = DaemonConfig::load(cli.config.as_deref())?;

    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }
    init_tracing(&config.logging.level, config.logging.json);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            println!(
                r#"
  ____ ___ ____ _____ ___
 |  _ \_ _|  _ \_   _/ _ \
 | | | | || |_) || || | | |
 | |_| | ||  __/ | || |_| |
 |____/___|_|    |_| \___/

  DIPTO - Replication Engine
  Version: {}
  Store: {:?}
  API: http://{}/api/v1
"#,
                env!("CARGO_PKG_VERSION"),
                config.store,
                config.server.listen_addr
            );

            let server = Server::new(&config)?;
            server.run().await
        }
        Command::Describe { title, category } => {
            let writer = GeminiWriter::new(&config.copywriter)?;
            let text = writer.describe(&title, &category).await?;
            println!("{}", text);
            Ok(())
        }
    }
}
