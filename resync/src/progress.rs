//! Progress reporting functionality for sync runs

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::error::{Result, SyncError};

/// Progress event types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// Sync run started
    SyncStarted {
        session_id: Uuid,
        origins: usize,
        destination: String,
    },
    /// All resources of one origin have been read
    OriginRead {
        origin: String,
        resources: usize,
        duration: Duration,
    },
    /// Resources are sorted and about to be written
    WriteStarted {
        resources_total: usize,
        batches_total: usize,
    },
    /// One batch reached the destination
    BatchWritten {
        resources: usize,
        resources_written: usize,
        resources_total: usize,
        elapsed_time: Duration,
    },
    /// Sync run completed
    SyncCompleted {
        session_id: Uuid,
        resources_written: usize,
        duration: Duration,
    },
    /// Sync run failed
    SyncFailed {
        session_id: Uuid,
        error: String,
        resources_written: usize,
        duration: Duration,
    },
    /// Info message
    Info {
        message: String,
    },
}

/// Progress channel for receiving progress updates
pub struct ProgressChannel {
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressChannel {
    /// Create a new progress channel
    pub fn new() -> (ProgressReporter, Self) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let reporter = ProgressReporter::new(sender);
        let channel = Self { receiver };
        (reporter, channel)
    }

    /// Receive the next progress event
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }

    /// Try to receive a progress event without blocking
    pub fn try_recv(&mut self) -> Result<ProgressEvent> {
        self.receiver.try_recv().map_err(|e| match e {
            mpsc::error::TryRecvError::Empty => {
                SyncError::Progress("No progress events available".to_string())
            }
            mpsc::error::TryRecvError::Disconnected => {
                SyncError::Progress("Progress channel disconnected".to_string())
            }
        })
    }

    /// Close the channel
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Progress reporter for sending progress updates
#[derive(Clone)]
pub struct ProgressReporter {
    sender: mpsc::UnboundedSender<ProgressEvent>,
    session_id: Uuid,
    start_time: Instant,
    state: Arc<RwLock<ProgressState>>,
}

#[derive(Debug, Default)]
struct ProgressState {
    resources_read: usize,
    resources_total: usize,
    resources_written: usize,
    batches_total: usize,
    batches_written: usize,
}

impl ProgressReporter {
    fn new(sender: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender,
            session_id: Uuid::new_v4(),
            start_time: Instant::now(),
            state: Arc::new(RwLock::new(ProgressState::default())),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Report sync started
    pub fn sync_started(&self, origins: usize, destination: impl Into<String>) -> Result<()> {
        self.send(ProgressEvent::SyncStarted {
            session_id: self.session_id,
            origins,
            destination: destination.into(),
        })
    }

    /// Report that an origin has been read
    pub async fn origin_read(
        &self,
        origin: impl Into<String>,
        resources: usize,
        duration: Duration,
    ) -> Result<()> {
        self.state.write().await.resources_read += resources;

        self.send(ProgressEvent::OriginRead {
            origin: origin.into(),
            resources,
            duration,
        })
    }

    /// Report the size of the write stage
    pub async fn write_started(&self, resources_total: usize, batches_total: usize) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.resources_total = resources_total;
            state.batches_total = batches_total;
        }

        self.send(ProgressEvent::WriteStarted {
            resources_total,
            batches_total,
        })
    }

    /// Report a written batch
    pub async fn batch_written(&self, resources: usize) -> Result<()> {
        let (resources_written, resources_total) = {
            let mut state = self.state.write().await;
            state.resources_written += resources;
            state.batches_written += 1;
            (state.resources_written, state.resources_total)
        };

        self.send(ProgressEvent::BatchWritten {
            resources,
            resources_written,
            resources_total,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    /// Report sync completed
    pub async fn sync_completed(&self) -> Result<()> {
        let state = self.state.read().await;

        self.send(ProgressEvent::SyncCompleted {
            session_id: self.session_id,
            resources_written: state.resources_written,
            duration: self.start_time.elapsed(),
        })
    }

    /// Report sync failed
    pub async fn sync_failed(&self, error: impl Into<String>) -> Result<()> {
        let state = self.state.read().await;

        self.send(ProgressEvent::SyncFailed {
            session_id: self.session_id,
            error: error.into(),
            resources_written: state.resources_written,
            duration: self.start_time.elapsed(),
        })
    }

    /// Report info
    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.send(ProgressEvent::Info {
            message: message.into(),
        })
    }

    fn send(&self, event: ProgressEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|_| SyncError::Progress("Progress channel disconnected".to_string()))
    }

    /// Get current progress state
    pub async fn get_progress(&self) -> ProgressSnapshot {
        let state = self.state.read().await;

        ProgressSnapshot {
            session_id: self.session_id,
            resources_read: state.resources_read,
            resources_total: state.resources_total,
            resources_written: state.resources_written,
            batches_total: state.batches_total,
            batches_written: state.batches_written,
            elapsed_time: self.start_time.elapsed(),
        }
    }
}

/// Snapshot of current progress state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub session_id: Uuid,
    pub resources_read: usize,
    pub resources_total: usize,
    pub resources_written: usize,
    pub batches_total: usize,
    pub batches_written: usize,
    pub elapsed_time: Duration,
}

impl ProgressSnapshot {
    /// Calculate completion percentage (0.0 to 1.0)
    pub fn completion_percentage(&self) -> f64 {
        if self.resources_total == 0 {
            1.0
        } else {
            self.resources_written as f64 / self.resources_total as f64
        }
    }

    /// Resources written per second
    pub fn write_rate(&self) -> f64 {
        if self.elapsed_time.as_secs_f64() > 0.0 {
            self.resources_written as f64 / self.elapsed_time.as_secs_f64()
        } else {
            0.0
        }
    }
}
