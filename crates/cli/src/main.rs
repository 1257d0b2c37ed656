mod app;
mod batch_commands;
mod chat_commands;
mod config_commands;
mod link_commands;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    linktrack_config::Severity,
    tracing::{debug, error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::app::App;

#[derive(Parser)]
#[command(
    name = "linktrack",
    version,
    about = "linktrack: watch GitHub and StackOverflow links, notify chats on change"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery in ./ and the user config dir).
    #[arg(long, global = true, env = "LINKTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Database URL (overrides config value).
    #[arg(long, global = true)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the update scheduler (default when no subcommand is provided).
    Serve,
    /// Chat registration.
    Chat {
        #[command(subcommand)]
        action: chat_commands::ChatAction,
    },
    /// Tracked links of a chat.
    Link {
        #[command(subcommand)]
        action: link_commands::LinkAction,
    },
    /// Check the oldest batch of links once and print the report.
    Check,
    /// Refresh every link's checkpoint without sending notifications.
    Resync,
    /// Purge links no chat tracks.
    Sweep,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Registry failures carry their category so callers can tell a bad request
/// from a missing chat or link.
pub(crate) fn registry_error(err: linktrack_common::Error) -> anyhow::Error {
    anyhow::anyhow!("{}: {err}", err.kind())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    let command = cli.command.unwrap_or(Commands::Serve);
    if let Commands::Config { action } = command {
        return config_commands::handle_config(action, cli.config.as_deref());
    }

    let loaded = linktrack_config::load(cli.config.as_deref())?;
    if let Some(path) = &loaded.path {
        debug!(path = %path.display(), "config loaded");
    }
    let mut config = loaded.config;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let errors: Vec<_> = linktrack_config::validate_config(&config)
        .into_iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    if !errors.is_empty() {
        for d in &errors {
            error!(path = %d.path, "{}", d.message);
        }
        anyhow::bail!("invalid configuration, run `linktrack config check` for details");
    }

    info!(version = env!("CARGO_PKG_VERSION"), "linktrack starting");
    let app = App::build(config).await?;

    match command {
        Commands::Serve => batch_commands::serve(&app).await,
        Commands::Chat { action } => chat_commands::handle_chat(&app, action).await,
        Commands::Link { action } => link_commands::handle_link(&app, action).await,
        Commands::Check => batch_commands::check(&app).await,
        Commands::Resync => batch_commands::resync(&app).await,
        Commands::Sweep => batch_commands::sweep(&app).await,
        Commands::Config { .. } => Ok(()),
    }
}
