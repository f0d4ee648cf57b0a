use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::remote::DownloadFormat;

#[derive(Parser, Debug)]
#[command(name = "meeting-intel")]
#[command(about = "Upload or record meetings, then read highlights and ask questions about them", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Meeting service URL (overrides server.base_url from the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Interactive session (default when no command is given)
    Shell,
    /// Upload a recording and wait for it to be processed
    Upload(UploadCliArgs),
    /// List meetings known to the service
    Meetings,
    /// Ask a question about a meeting
    Ask(AskCliArgs),
    /// Generate highlight notes for a meeting
    Notes(MeetingCliArgs),
    /// Download the notes of a meeting
    Download(DownloadCliArgs),
    /// Check that the meeting service is reachable
    Ping,
    /// Show the config file or its location
    Config(ConfigCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct UploadCliArgs {
    /// Audio or video file (mp3, wav, mp4, ...)
    pub file: PathBuf,
    /// Display name for the meeting; prompts when omitted on a terminal
    #[arg(short, long)]
    pub name: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct MeetingCliArgs {
    /// Meeting ID as shown by `meeting-intel meetings`
    #[arg(short, long)]
    pub meeting: String,
}

#[derive(ClapArgs, Debug)]
pub struct AskCliArgs {
    /// Meeting ID as shown by `meeting-intel meetings`
    #[arg(short, long)]
    pub meeting: String,
    /// The question
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct DownloadCliArgs {
    /// Meeting ID as shown by `meeting-intel meetings`
    #[arg(short, long)]
    pub meeting: String,
    /// Notes format: txt, pdf or docx (default from config)
    #[arg(short, long)]
    pub format: Option<DownloadFormat>,
    /// Directory to save into (default from config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct ConfigCliArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
}
