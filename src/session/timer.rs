//! Elapsed-time counter shown while a recording is running.

use chrono::{DateTime, Local, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Point-in-time reading of a running [`RecordingTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerReading {
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
}

impl TimerReading {
    /// Wall-clock start in local time, `HH:MM:SS`.
    pub fn started_label(&self) -> String {
        self.started_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// Ticks once per second on a background task until stopped.
pub struct RecordingTimer {
    started_at: DateTime<Utc>,
    elapsed: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl RecordingTimer {
    pub fn start() -> Self {
        let elapsed = Arc::new(AtomicU64::new(0));
        let ticker = Arc::clone(&elapsed);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // First tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                ticker.fetch_add(1, Ordering::Relaxed);
            }
        });

        Self {
            started_at: Utc::now(),
            elapsed,
            handle: Some(handle),
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }

    pub fn reading(&self) -> TimerReading {
        TimerReading {
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds(),
        }
    }

    /// Cancel the ticker and return the final count.
    pub fn stop(mut self) -> u64 {
        self.cancel();
        self.elapsed_seconds()
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Recording timer cancelled at {}s", self.elapsed_seconds());
        }
    }
}

impl Drop for RecordingTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// `mm:ss` for the status line.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_counts_seconds() {
        let timer = RecordingTimer::start();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(timer.elapsed_seconds(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_timer_no_longer_ticks() {
        let timer = RecordingTimer::start();
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let elapsed = Arc::clone(&timer.elapsed);
        assert_eq!(timer.stop(), 2);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(elapsed.load(Ordering::Relaxed), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reading_carries_start_time() {
        let before = Utc::now();
        let timer = RecordingTimer::start();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let reading = timer.reading();
        assert_eq!(reading.elapsed_seconds, 1);
        assert!(reading.started_at >= before);
        assert_eq!(reading.started_label().len(), "12:00:00".len());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(75), "01:15");
        assert_eq!(format_elapsed(3600), "60:00");
    }
}
