use anyhow::Result;
use clap::Parser;
use meeting_intel::{
    cli::{
        handle_ask_command, handle_config_command, handle_download_command,
        handle_meetings_command, handle_notes_command, handle_ping_command,
        handle_upload_command, run_shell, Cli, CliCommand,
    },
    config::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Logs go to stderr; stdout belongs to the shell.
    let log_level = if cli.verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(CliCommand::Version) = cli.command {
        println!("meeting-intel {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load()?.with_base_url(cli.api_url);

    match cli.command {
        Some(CliCommand::Upload(args)) => handle_upload_command(&config, args).await,
        Some(CliCommand::Meetings) => handle_meetings_command(&config).await,
        Some(CliCommand::Ask(args)) => handle_ask_command(&config, args).await,
        Some(CliCommand::Notes(args)) => handle_notes_command(&config, args).await,
        Some(CliCommand::Download(args)) => handle_download_command(&config, args).await,
        Some(CliCommand::Ping) => handle_ping_command(&config).await,
        Some(CliCommand::Config(args)) => handle_config_command(&config, args),
        Some(CliCommand::Shell) | Some(CliCommand::Version) | None => run_shell(config).await,
    }
}
