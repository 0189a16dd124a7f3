mod check_commands;

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Context, bail},
    clap::{Parser, Subcommand},
    hookfeed_chat::{ChatClient, MattermostClient},
    hookfeed_config::HookfeedConfig,
    hookfeed_relay::{Relay, RelaySettings},
    secrecy::ExposeSecret,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(
    name = "hookfeed",
    version,
    about = "hookfeed: GitHub activity feeds for Mattermost"
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

    /// Config file (default: ./hookfeed.toml, then ~/.config/hookfeed/).
    #[arg(long, short, global = true, env = "HOOKFEED_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server (default when no subcommand is provided).
    Serve,
    /// Verify the configured team and channels exist, then exit.
    Check,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<HookfeedConfig> {
    match &cli.config {
        Some(path) => hookfeed_config::load_config(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(hookfeed_config::discover_and_load()),
    }
}

/// Connect to the chat server and build an activated relay.
async fn connect(config: &HookfeedConfig) -> anyhow::Result<(Arc<Relay>, bool)> {
    let mattermost = &config.mattermost;
    if mattermost.url.trim().is_empty() {
        bail!("mattermost.url is not set");
    }
    if mattermost.token.expose_secret().is_empty() {
        bail!("mattermost.token is not set");
    }
    if config.github.webhook_secret.is_none() {
        warn!("github.webhook_secret is not set, deliveries will not be authenticated");
    }

    let chat: Arc<dyn ChatClient> = Arc::new(MattermostClient::new(
        mattermost.url.trim(),
        mattermost.token.clone(),
    )?);
    let relay = Arc::new(Relay::new(chat, RelaySettings::from_config(config)));
    let report = relay.activate().await.context("activating relay")?;
    let passed = report.passed();
    check_commands::print_report(&report);
    Ok((relay, passed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "hookfeed starting");

    let config = load_config(&cli)?;

    match cli.command {
        // Default: serve when no subcommand is provided
        None | Some(Commands::Serve) => {
            let (relay, _) = connect(&config).await?;

            // Kept alive for the lifetime of the server
            let _watcher = match cli.config.clone().or_else(hookfeed_config::find_config_file) {
                Some(path) => hookfeed_gateway::watch_config(&path, Arc::clone(&relay))
                    .inspect_err(|e| warn!(error = %e, "config file will not be watched"))
                    .ok(),
                None => None,
            };

            // CLI args override config values
            let bind = cli.bind.unwrap_or(config.server.bind);
            let port = cli.port.unwrap_or(config.server.port);
            hookfeed_gateway::serve(&bind, port, relay).await
        },
        Some(Commands::Check) => {
            let (_, passed) = connect(&config).await?;
            if !passed {
                std::process::exit(1);
            }
            Ok(())
        },
    }
}
