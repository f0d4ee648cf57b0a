//! Terminal interaction: busy spinner and the meeting naming prompt.

use async_trait::async_trait;
use dialoguer::{theme::ColorfulTheme, Input};
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

use crate::remote::MeetingId;
use crate::session::MeetingNamer;

/// Spinner shown while a remote call is in flight.
///
/// Cloned handles share the same spinner so prompts raised mid-call can hide it.
#[derive(Clone, Default)]
pub struct Activity {
    current: Arc<Mutex<Option<ProgressBar>>>,
}

impl Activity {
    /// Show `message` with a spinner until `future` completes.
    pub async fn run<F: Future>(&self, message: &str, future: F) -> F::Output {
        self.begin(message);
        let output = future.await;
        self.end();
        output
    }

    fn begin(&self, message: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut current) = self.current.lock() {
            if let Some(previous) = current.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn end(&self) {
        if let Some(pb) = self.current.lock().ok().and_then(|mut current| current.take()) {
            pb.finish_and_clear();
        }
    }

    /// Run `f` with the spinner hidden.
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        let pb = self.current.lock().ok().and_then(|current| current.clone());
        match pb {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }
}

/// Asks for a meeting name on the terminal.
pub struct DialoguerNamer {
    activity: Activity,
}

impl DialoguerNamer {
    pub fn new(activity: Activity) -> Self {
        Self { activity }
    }
}

#[async_trait]
impl MeetingNamer for DialoguerNamer {
    async fn prompt_name(&self, meeting_id: &MeetingId) -> Option<String> {
        let activity = self.activity.clone();
        let prompt = format!("Name for meeting {} (blank for default)", meeting_id);

        let answer = tokio::task::spawn_blocking(move || {
            activity.suspend(|| {
                Input::<String>::with_theme(&ColorfulTheme::default())
                    .with_prompt(prompt)
                    .allow_empty(true)
                    .interact_text()
            })
        })
        .await;

        match answer {
            Ok(Ok(name)) => Some(name),
            Ok(Err(e)) => {
                warn!("Naming prompt failed: {}", e);
                None
            }
            Err(e) => {
                warn!("Naming prompt task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_activity_returns_future_output() {
        let activity = Activity::default();
        let value = activity.run("Working...", async { 41 + 1 }).await;
        assert_eq!(value, 42);
        assert!(activity.current.lock().unwrap().is_none());
    }

    #[test]
    fn test_suspend_without_spinner_runs_closure() {
        let activity = Activity::default();
        assert_eq!(activity.suspend(|| "ran"), "ran");
    }
}
