pub mod api;
pub mod cli;
pub mod config;
pub mod render;
pub mod session;
pub mod transcript;

use api::ApiClient;
use clap::Parser;
use cli::{CliArgs, Command};
use tracing_subscriber::EnvFilter;

/// Parse arguments, resolve configuration and drive the chosen command.
/// `Ok(false)` means the command ran but the backend did not succeed.
pub fn run() -> anyhow::Result<bool> {
    let args = CliArgs::parse();
    let config = args.load_config()?;
    init_tracing(args.log_level.as_deref(), &config.log_level);

    let client = ApiClient::new(&config)?;
    tracing::debug!(base_url = client.base_url(), "Client ready");

    // One thread: state changes happen only between awaited events.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let command = args.command.unwrap_or(Command::Chat);
    runtime.block_on(async {
        let mut stdout = std::io::stdout();
        match command {
            Command::Chat => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                cli::run_chat(&config, client, stdin, &mut stdout).await
            }
            Command::Ask { question } => {
                cli::run_ask(&config, &client, &question, &mut stdout).await
            }
            Command::Upload { file, title } => {
                cli::run_upload(&client, &file, &title, &mut stdout).await
            }
        }
    })
}

/// Level: --log-level flag > RUST_LOG > config file.
fn init_tracing(flag_level: Option<&str>, config_level: &str) {
    let filter = match flag_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level)),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
