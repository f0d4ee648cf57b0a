//! One-shot subcommands. Each builds its own controller, runs one flow and exits.

use anyhow::{anyhow, Context, Result};
use std::io::{self, IsTerminal};
use std::sync::Arc;

use crate::config::Config;
use crate::remote::{DownloadFormat, MeetingApiClient, MeetingBackend, MeetingId};
use crate::session::{
    ChatRole, DefaultName, FixedName, MeetingNamer, Outcome, SessionController,
};

use super::args::{AskCliArgs, ConfigCliArgs, ConfigCommand, DownloadCliArgs, MeetingCliArgs, UploadCliArgs};
use super::prompt::{Activity, DialoguerNamer};

fn client(config: &Config) -> Result<MeetingApiClient> {
    MeetingApiClient::new(&config.server.base_url, config.server.request_timeout())
}

fn controller(config: &Config, namer: Box<dyn MeetingNamer>) -> Result<SessionController> {
    let backend: Arc<dyn MeetingBackend> = Arc::new(client(config)?);
    Ok(SessionController::new(
        backend,
        namer,
        config.session.default_meeting_name.clone(),
    ))
}

/// Turn a command outcome into an error for the process exit status.
fn require<T>(outcome: Outcome<T>) -> Result<T> {
    match outcome {
        Outcome::Done(value) => Ok(value),
        other => Err(anyhow!(other
            .message()
            .unwrap_or_else(|| "Operation failed.".to_string()))),
    }
}

/// Load the meeting list and make `meeting` the active meeting.
async fn open_meeting(controller: &SessionController, meeting: &str) -> Result<()> {
    require(controller.refresh_history().await).context("Failed to connect to the meeting service. Is it running?")?;

    let id = MeetingId::from(meeting);
    let session = controller.snapshot().await;
    let name = session
        .history()
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.name.clone())
        .ok_or_else(|| anyhow!("Meeting {} not found", meeting))?;

    require(controller.select_meeting(&id, &name).await)
}

pub async fn handle_upload_command(config: &Config, args: UploadCliArgs) -> Result<()> {
    let activity = Activity::default();
    let namer: Box<dyn MeetingNamer> = match args.name {
        Some(name) => Box::new(FixedName(name)),
        None if io::stdin().is_terminal() && config.session.prompt_for_name => {
            Box::new(DialoguerNamer::new(activity.clone()))
        }
        None => Box::new(DefaultName),
    };
    let controller = controller(config, namer)?;

    let file = require(controller.select_file(&args.file).await)?;
    eprintln!("{} ({:.1} MB) selected", file.display_name(), file.size_mb());

    let meeting_id = require(
        activity
            .run("Uploading & processing meeting...", controller.upload())
            .await,
    )?;

    let session = controller.snapshot().await;
    println!(
        "Meeting {} ready: {}",
        meeting_id,
        session.meeting_name().unwrap_or(&config.session.default_meeting_name)
    );
    if let Some(warning) = session.last_error() {
        eprintln!("{}", warning);
    }

    Ok(())
}

pub async fn handle_meetings_command(config: &Config) -> Result<()> {
    let meetings = client(config)?
        .list_meetings()
        .await
        .context("Failed to connect to the meeting service. Is it running?")?;

    if meetings.is_empty() {
        println!("No meetings yet.");
        return Ok(());
    }

    for meeting in meetings {
        let name = if meeting.name.trim().is_empty() {
            "(unnamed)"
        } else {
            meeting.name.as_str()
        };
        println!("{}  {}", meeting.id, name);
    }

    Ok(())
}

pub async fn handle_ask_command(config: &Config, args: AskCliArgs) -> Result<()> {
    let controller = controller(config, Box::new(DefaultName))?;
    open_meeting(&controller, &args.meeting).await?;

    let question = args.question.join(" ");
    let activity = Activity::default();
    require(activity.run("Thinking...", controller.ask(&question)).await)?;

    let session = controller.snapshot().await;
    if let Some(answer) = session
        .chat_log()
        .iter()
        .rev()
        .find(|entry| entry.role == ChatRole::Assistant)
    {
        println!("{}", answer.text);
    }

    Ok(())
}

pub async fn handle_notes_command(config: &Config, args: MeetingCliArgs) -> Result<()> {
    let controller = controller(config, Box::new(DefaultName))?;
    open_meeting(&controller, &args.meeting).await?;

    let activity = Activity::default();
    require(
        activity
            .run("Generating highlights...", controller.generate_notes())
            .await,
    )?;

    for line in controller.snapshot().await.note_lines() {
        println!("{}", line);
    }

    Ok(())
}

pub async fn handle_download_command(config: &Config, args: DownloadCliArgs) -> Result<()> {
    let format = match args.format {
        Some(format) => format,
        None => config
            .session
            .default_download_format
            .parse::<DownloadFormat>()
            .map_err(|e| anyhow!(e))?,
    };
    let dir = args
        .output_dir
        .unwrap_or_else(|| config.session.download_dir());

    let controller = controller(config, Box::new(DefaultName))?;
    open_meeting(&controller, &args.meeting).await?;

    let activity = Activity::default();
    let path = require(
        activity
            .run("Downloading notes...", controller.download_notes(format, &dir))
            .await,
    )?;

    println!("Notes saved to {}", path.display());
    Ok(())
}

pub async fn handle_ping_command(config: &Config) -> Result<()> {
    let message = client(config)?
        .health()
        .await
        .with_context(|| format!("Meeting service at {} is not reachable", config.server.base_url))?;

    println!("{}: {}", config.server.base_url, message);
    Ok(())
}

pub fn handle_config_command(config: &Config, args: ConfigCliArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            print!("{}", content);
        }
        ConfigCommand::Path => {
            println!("{}", Config::config_path()?.display());
        }
    }
    Ok(())
}
