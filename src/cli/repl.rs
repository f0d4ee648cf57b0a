//! Interactive shell around a single [`SessionController`].

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::debug;

use crate::config::Config;
use crate::remote::{DownloadFormat, MeetingApiClient, MeetingBackend, MeetingId};
use crate::session::{ChatRole, DefaultName, MeetingNamer, Outcome, SessionController};

use super::prompt::{Activity, DialoguerNamer};

const HELP: &str = "\
Commands:
  record             start recording on the server
  stop               stop recording and process the meeting
  file <path>        choose a file to upload
  upload             upload the chosen file and process it
  notes              generate highlight notes
  ask <question>     ask about the meeting (plain text works too)
  history            list past meetings
  select <n|id>      make a past meeting active
  download [format]  save notes (txt, pdf, docx)
  status             show the current session
  help               show this help
  quit               leave the shell";

/// A parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Record,
    Stop,
    File(PathBuf),
    Upload,
    Notes,
    Ask(String),
    History,
    Select(String),
    Download(Option<DownloadFormat>),
    Status,
    Help,
    Quit,
}

impl ReplCommand {
    /// `Ok(None)` for a blank line. Text that is not a command is a question.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let word = word.to_ascii_lowercase();

        // Bare keywords only: "Start date of the launch?" is a question.
        if !rest.is_empty() && !matches!(word.as_str(), "file" | "ask" | "select" | "open" | "download")
        {
            return Ok(Some(Self::Ask(line.to_string())));
        }

        let command = match word.as_str() {
            "record" | "start" => Self::Record,
            "stop" => Self::Stop,
            "file" => {
                let path = rest.trim_matches(|c| c == '"' || c == '\'');
                if path.is_empty() {
                    return Err("Usage: file <path>".to_string());
                }
                Self::File(PathBuf::from(path))
            }
            "upload" => Self::Upload,
            "notes" | "highlights" => Self::Notes,
            "ask" => {
                if rest.is_empty() {
                    return Err("Usage: ask <question>".to_string());
                }
                Self::Ask(rest.to_string())
            }
            "history" | "meetings" => Self::History,
            "select" | "open" => {
                if rest.is_empty() {
                    return Err("Usage: select <number|id>".to_string());
                }
                Self::Select(rest.to_string())
            }
            "download" => {
                if rest.is_empty() {
                    Self::Download(None)
                } else {
                    Self::Download(Some(rest.parse()?))
                }
            }
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => Self::Ask(line.to_string()),
        };

        Ok(Some(command))
    }
}

enum LineReader {
    Terminal,
    Piped(Lines<BufReader<Stdin>>),
}

impl LineReader {
    fn new(interactive: bool) -> Self {
        if interactive {
            Self::Terminal
        } else {
            Self::Piped(BufReader::new(tokio::io::stdin()).lines())
        }
    }

    /// `None` at end of input.
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self {
            Self::Terminal => {
                let line = tokio::task::spawn_blocking(|| {
                    Input::<String>::with_theme(&ColorfulTheme::default())
                        .with_prompt("meeting")
                        .allow_empty(true)
                        .interact_text()
                })
                .await?;
                match line {
                    Ok(line) => Ok(Some(line)),
                    Err(e) => {
                        debug!("Input closed: {}", e);
                        Ok(None)
                    }
                }
            }
            Self::Piped(lines) => Ok(lines.next_line().await?),
        }
    }
}

/// Run the interactive shell until `quit` or end of input.
pub async fn run_shell(config: Config) -> Result<()> {
    let client = MeetingApiClient::new(&config.server.base_url, config.server.request_timeout())?;
    let backend: Arc<dyn MeetingBackend> = Arc::new(client);

    let interactive = io::stdin().is_terminal();
    let activity = Activity::default();
    let namer: Box<dyn MeetingNamer> = if interactive && config.session.prompt_for_name {
        Box::new(DialoguerNamer::new(activity.clone()))
    } else {
        Box::new(DefaultName)
    };

    let controller = SessionController::new(
        backend,
        namer,
        config.session.default_meeting_name.clone(),
    );
    let shell = Shell {
        controller,
        activity,
        config,
    };

    println!(
        "Meeting Intelligence shell ({}). Type `help` for commands.",
        shell.config.server.base_url
    );
    shell.show_history().await;

    let mut reader = LineReader::new(interactive);
    while let Some(line) = reader.next_line().await? {
        match ReplCommand::parse(&line) {
            Ok(Some(ReplCommand::Quit)) => break,
            Ok(Some(command)) => shell.execute(command).await,
            Ok(None) => {}
            Err(usage) => println!("{}", usage),
        }
    }

    Ok(())
}

struct Shell {
    controller: SessionController,
    activity: Activity,
    config: Config,
}

impl Shell {
    async fn execute(&self, command: ReplCommand) {
        match command {
            ReplCommand::Record => {
                let outcome = self
                    .activity
                    .run("Starting recording...", self.controller.start_recording())
                    .await;
                report(&outcome);
                if outcome.is_done() {
                    println!("Recording. Type `stop` when the meeting ends.");
                }
            }
            ReplCommand::Stop => {
                let outcome = self
                    .activity
                    .run("Processing meeting...", self.controller.stop_recording())
                    .await;
                report(&outcome);
                if outcome.is_done() {
                    println!("Meeting recorded successfully. You can now ask questions!");
                    self.print_status().await;
                }
            }
            ReplCommand::File(path) => match self.controller.select_file(&path).await {
                Outcome::Done(file) => {
                    println!("{} ({:.1} MB) selected", file.display_name(), file.size_mb())
                }
                other => report(&other),
            },
            ReplCommand::Upload => {
                let outcome = self
                    .activity
                    .run("Processing meeting...", self.controller.upload())
                    .await;
                report(&outcome);
                if outcome.is_done() {
                    println!("Meeting uploaded and processed successfully. Ask anything about it!");
                    self.print_status().await;
                }
            }
            ReplCommand::Notes => {
                let outcome = self
                    .activity
                    .run("Generating highlights...", self.controller.generate_notes())
                    .await;
                if !outcome.is_done() {
                    report(&outcome);
                    return;
                }
                println!("--- Highlights ---");
                for line in self.controller.view().await.notes {
                    println!("{}", line);
                }
            }
            ReplCommand::Ask(question) => {
                let outcome = self
                    .activity
                    .run("Thinking...", self.controller.ask(&question))
                    .await;
                match outcome {
                    Outcome::Done(()) | Outcome::Failed(_) => {
                        let session = self.controller.snapshot().await;
                        if let Some(answer) = session
                            .chat_log()
                            .iter()
                            .rev()
                            .find(|entry| entry.role == ChatRole::Assistant)
                        {
                            println!("{}", answer.text);
                        }
                    }
                    other => report(&other),
                }
            }
            ReplCommand::History => self.show_history().await,
            ReplCommand::Select(target) => self.select(&target).await,
            ReplCommand::Download(format) => {
                let format = match format {
                    Some(format) => format,
                    None => match self.config.session.default_download_format.parse() {
                        Ok(format) => format,
                        Err(e) => {
                            println!("{}", e);
                            return;
                        }
                    },
                };
                let dir = self.config.session.download_dir();
                let outcome = self
                    .activity
                    .run(
                        "Downloading notes...",
                        self.controller.download_notes(format, &dir),
                    )
                    .await;
                match outcome {
                    Outcome::Done(path) => println!("Notes saved to {}", path.display()),
                    other => report(&other),
                }
            }
            ReplCommand::Status => self.print_status().await,
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Quit => {}
        }
    }

    async fn print_status(&self) {
        print!("{}", self.controller.view().await);
    }

    async fn show_history(&self) {
        let outcome = self
            .activity
            .run("Loading meetings...", self.controller.refresh_history())
            .await;
        if !outcome.is_done() {
            report(&outcome);
            return;
        }

        let session = self.controller.snapshot().await;
        if session.history().is_empty() {
            println!("No meetings yet. Use `file <path>` + `upload`, or `record`.");
            return;
        }

        for (index, meeting) in session.history().iter().enumerate() {
            let marker = if session.active_meeting_id() == Some(&meeting.id) {
                "*"
            } else {
                " "
            };
            println!("{}{:>3}. {} [{}]", marker, index + 1, display_name(&meeting.name), meeting.id);
        }
    }

    async fn select(&self, target: &str) {
        let session = self.controller.snapshot().await;
        let history = session.history();

        let chosen = match target.parse::<usize>() {
            Ok(n) if n >= 1 && n <= history.len() => Some(&history[n - 1]),
            _ => history.iter().find(|m| m.id.as_str() == target),
        };

        let (id, name) = match chosen {
            Some(meeting) => (meeting.id.clone(), meeting.name.clone()),
            None => (MeetingId::from(target), String::new()),
        };

        match self.controller.select_meeting(&id, &name).await {
            Outcome::Done(()) => println!(
                "Switched to {}. Ask anything about it!",
                display_name(&name)
            ),
            other => report(&other),
        }
    }
}

fn display_name(name: &str) -> &str {
    if name.trim().is_empty() {
        "(unnamed)"
    } else {
        name
    }
}

fn report<T>(outcome: &Outcome<T>) {
    if let Some(message) = outcome.message() {
        println!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blank_line() {
        assert_eq!(ReplCommand::parse("   "), Ok(None));
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(ReplCommand::parse("record"), Ok(Some(ReplCommand::Record)));
        assert_eq!(ReplCommand::parse("STOP"), Ok(Some(ReplCommand::Stop)));
        assert_eq!(ReplCommand::parse("upload"), Ok(Some(ReplCommand::Upload)));
        assert_eq!(ReplCommand::parse("history"), Ok(Some(ReplCommand::History)));
        assert_eq!(ReplCommand::parse("quit"), Ok(Some(ReplCommand::Quit)));
        assert_eq!(
            ReplCommand::parse("select 2"),
            Ok(Some(ReplCommand::Select("2".to_string())))
        );
    }

    #[test]
    fn test_parse_file_path_with_spaces() {
        assert_eq!(
            ReplCommand::parse("file \"/tmp/weekly sync.mp4\""),
            Ok(Some(ReplCommand::File(PathBuf::from("/tmp/weekly sync.mp4"))))
        );
        assert!(ReplCommand::parse("file").is_err());
    }

    #[test]
    fn test_parse_download_format() {
        assert_eq!(
            ReplCommand::parse("download"),
            Ok(Some(ReplCommand::Download(None)))
        );
        assert_eq!(
            ReplCommand::parse("download pdf"),
            Ok(Some(ReplCommand::Download(Some(DownloadFormat::Pdf))))
        );
        assert!(ReplCommand::parse("download odt").is_err());
    }

    #[test]
    fn test_question_starting_with_keyword_is_a_question() {
        for line in [
            "Start date of the launch?",
            "stop using the old vendor?",
            "History of the budget discussion?",
            "upload speeds were mentioned?",
            "Status of the hiring plan?",
        ] {
            assert_eq!(
                ReplCommand::parse(line),
                Ok(Some(ReplCommand::Ask(line.to_string()))),
                "{line}"
            );
        }
    }

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            ReplCommand::parse("What was decided?"),
            Ok(Some(ReplCommand::Ask("What was decided?".to_string())))
        );
        assert_eq!(
            ReplCommand::parse("ask who owns the follow-up?"),
            Ok(Some(ReplCommand::Ask("who owns the follow-up?".to_string())))
        );
        assert!(ReplCommand::parse("ask").is_err());
    }
}
