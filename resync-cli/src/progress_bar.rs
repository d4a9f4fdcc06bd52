//! Terminal rendering of sync progress events

use indicatif::{ProgressBar, ProgressStyle};
use resync::{ProgressChannel, ProgressEvent};
use std::time::Duration;
use tracing::debug;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// A spinner while origins are read, then a bar over the resources written
pub struct SyncProgress {
    bar: ProgressBar,
}

impl SyncProgress {
    /// Draws to stderr
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(spinner_style());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    #[cfg(test)]
    fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Render events until every reporter is dropped
    pub async fn run(self, mut channel: ProgressChannel) {
        while let Some(event) = channel.recv().await {
            self.handle(event);
        }
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    pub fn handle(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::SyncStarted {
                origins,
                destination,
                ..
            } => {
                self.bar
                    .set_message(format!("Reading {origins} origin(s) for {destination}"));
            }
            ProgressEvent::OriginRead {
                origin,
                resources,
                duration,
            } => {
                self.bar.println(format!(
                    "Read {resources} resources from {origin} in {duration:.1?}"
                ));
            }
            ProgressEvent::WriteStarted {
                resources_total, ..
            } => {
                self.bar.set_style(bar_style());
                self.bar.set_length(resources_total as u64);
                self.bar.set_position(0);
                self.bar.set_message("Writing");
            }
            ProgressEvent::BatchWritten { resources, .. } => {
                self.bar.inc(resources as u64);
            }
            ProgressEvent::SyncCompleted {
                resources_written,
                duration,
                ..
            } => {
                self.bar.finish_with_message(format!(
                    "Synced {resources_written} resources in {duration:.1?}"
                ));
            }
            ProgressEvent::SyncFailed {
                error,
                resources_written,
                ..
            } => {
                self.bar.abandon_with_message(format!(
                    "Failed after {resources_written} resources: {error}"
                ));
            }
            ProgressEvent::Info { message } => {
                debug!("{message}");
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICK_CHARS)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {eta}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏ ")
    .tick_chars(TICK_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(resources: usize) -> ProgressEvent {
        ProgressEvent::BatchWritten {
            resources,
            resources_written: 0,
            resources_total: 0,
            elapsed_time: Duration::ZERO,
        }
    }

    #[test]
    fn test_bar_tracks_written_resources() {
        let progress = SyncProgress::hidden();

        progress.handle(ProgressEvent::WriteStarted {
            resources_total: 5,
            batches_total: 3,
        });
        progress.handle(batch(2));
        progress.handle(batch(2));

        assert_eq!(progress.bar.length(), Some(5));
        assert_eq!(progress.bar.position(), 4);
        assert!(!progress.bar.is_finished());
    }

    #[test]
    fn test_completion_finishes_bar() {
        let progress = SyncProgress::hidden();

        progress.handle(ProgressEvent::WriteStarted {
            resources_total: 1,
            batches_total: 1,
        });
        progress.handle(batch(1));
        progress.handle(ProgressEvent::SyncCompleted {
            session_id: ProgressChannel::new().0.session_id(),
            resources_written: 1,
            duration: Duration::from_millis(20),
        });

        assert!(progress.bar.is_finished());
    }

    #[test]
    fn test_failure_abandons_bar() {
        let progress = SyncProgress::hidden();

        progress.handle(ProgressEvent::SyncFailed {
            session_id: ProgressChannel::new().0.session_id(),
            error: "Found cycle at http://example.com/foo/1".to_string(),
            resources_written: 0,
            duration: Duration::ZERO,
        });

        assert!(progress.bar.is_finished());
    }

    #[tokio::test]
    async fn test_run_ends_when_reporter_drops() {
        let (reporter, channel) = ProgressChannel::new();
        reporter.write_started(2, 1).await.unwrap();
        reporter.batch_written(2).await.unwrap();
        drop(reporter);

        SyncProgress::hidden().run(channel).await;
    }
}
