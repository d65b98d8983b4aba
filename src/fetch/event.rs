//!
//! # Fetch events
//! Progress is marshaled from the worker to whoever presents it
//!

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::fetch::error::FetchError;
use crate::fetch::state::FetchState;

#[derive(Debug, Clone, Serialize)]
pub struct FetchEvent {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: FetchEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FetchEventKind {
    Connecting,
    Transferring {
        content_length: Option<u64>,
    },
    Progress {
        transferred: u64,
        content_length: Option<u64>,
    },
    Succeeded {
        transferred: u64,
        destination: PathBuf,
    },
    Failed {
        transferred: u64,
        reason: String,
    },
}

impl FetchEventKind {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchEventKind::Succeeded { .. } | FetchEventKind::Failed { .. })
    }

    /// Byte counters carried by the event; terminal events do not repeat the length
    pub fn progress(&self) -> Option<FetchProgress> {
        match *self {
            FetchEventKind::Connecting => None,
            FetchEventKind::Transferring { content_length } => Some(FetchProgress {
                transferred: 0,
                content_length,
            }),
            FetchEventKind::Progress { transferred, content_length } => Some(FetchProgress {
                transferred,
                content_length,
            }),
            FetchEventKind::Succeeded { transferred, .. } | FetchEventKind::Failed { transferred, .. } => {
                Some(FetchProgress {
                    transferred,
                    content_length: None,
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchProgress {
    pub transferred: u64,
    pub content_length: Option<u64>,
}

impl FetchProgress {
    /// Completion in `0.0..=1.0`, `None` while the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        match self.content_length {
            Some(total) if total > 0 => Some((self.transferred as f64 / total as f64).min(1.0)),
            _ => None,
        }
    }
}

/// Worker side of a fetch: owns the state cell, the byte counter and the event sender
pub(crate) struct Reporter {
    id: Uuid,
    state: Arc<RwLock<FetchState>>,
    transferred: watch::Sender<u64>,
    content_length: RwLock<Option<u64>>,
    events: mpsc::UnboundedSender<FetchEvent>,
}

impl Reporter {
    pub(crate) fn new(
        id: Uuid,
        events: mpsc::UnboundedSender<FetchEvent>,
    ) -> (Self, Arc<RwLock<FetchState>>, watch::Receiver<u64>) {
        let state = Arc::new(RwLock::new(FetchState::Idle));
        let (transferred, transferred_receiver) = watch::channel(0);
        let reporter = Self {
            id,
            transferred,
            events,
            state: state.clone(),
            content_length: RwLock::new(None),
        };

        (reporter, state, transferred_receiver)
    }

    pub(crate) fn connecting(&self) {
        if self.advance(FetchState::Connecting) {
            self.emit(FetchEventKind::Connecting);
        }
    }

    pub(crate) fn transferring(&self, content_length: Option<u64>) {
        *self.content_length.write() = content_length;
        if self.advance(FetchState::Transferring) {
            self.emit(FetchEventKind::Transferring { content_length });
        }
    }

    pub(crate) fn progress(&self, transferred: u64) {
        if *self.state.read() != FetchState::Transferring {
            return;
        }

        self.transferred.send_replace(transferred);
        self.emit(FetchEventKind::Progress {
            transferred,
            content_length: *self.content_length.read(),
        });
    }

    pub(crate) fn succeeded(&self, transferred: u64, destination: &Path) {
        if self.advance(FetchState::Succeeded) {
            self.transferred.send_replace(transferred);
            self.emit(FetchEventKind::Succeeded {
                transferred,
                destination: destination.to_path_buf(),
            });
        }
    }

    pub(crate) fn failed(&self, error: &FetchError) {
        if self.advance(FetchState::Failed) {
            self.emit(FetchEventKind::Failed {
                transferred: *self.transferred.borrow(),
                reason: error.to_string(),
            });
        }
    }

    fn advance(&self, next: FetchState) -> bool {
        let mut state = self.state.write();
        if !state.can_advance_to(next) {
            warn!("Fetch {} cannot move from {:?} to {:?}", self.id, *state, next);
            return false;
        }

        *state = next;
        true
    }

    fn emit(&self, kind: FetchEventKind) {
        let event = FetchEvent { id: self.id, kind };
        // The consumer may be gone, the transfer still runs to the end
        if self.events.send(event).is_err() {
            debug!("No event receiver for fetch {}", self.id);
        }
    }
}
