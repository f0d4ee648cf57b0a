pub mod args;
pub mod commands;
pub mod prompt;
pub mod repl;

pub use args::{Cli, CliCommand};
pub use commands::{
    handle_ask_command, handle_config_command, handle_download_command, handle_meetings_command,
    handle_notes_command, handle_ping_command, handle_upload_command,
};
pub use repl::run_shell;
