use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::Stream;
use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::fetch::error::FetchError;
use crate::fetch::state::FetchState;

/// Caller side of a spawned fetch
pub struct FetchHandle {
    id: Uuid,
    destination: PathBuf,
    state: Arc<RwLock<FetchState>>,
    transferred_receiver: watch::Receiver<u64>,
    join_handle: JoinHandle<Result<u64, FetchError>>,
}

impl FetchHandle {
    pub(crate) fn new(
        id: Uuid,
        destination: PathBuf,
        state: Arc<RwLock<FetchState>>,
        transferred_receiver: watch::Receiver<u64>,
        join_handle: JoinHandle<Result<u64, FetchError>>,
    ) -> Self {
        Self {
            id,
            destination,
            state,
            transferred_receiver,
            join_handle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn state(&self) -> FetchState {
        *self.state.read()
    }

    pub fn transferred(&self) -> u64 {
        *self.transferred_receiver.borrow()
    }

    /// Cumulative byte counts; intermediate values may be skipped, the last one never is
    pub fn progress_stream(&self) -> impl Stream<Item = u64> + 'static {
        let mut receiver = self.transferred_receiver.clone();

        async_stream::stream! {
            let len = *receiver.borrow_and_update();
            yield len;

            while receiver.changed().await.is_ok() {
                let len = *receiver.borrow_and_update();
                yield len;
            }
        }
    }

    pub async fn join(self) -> Result<u64, FetchError> {
        self.join_handle.await?
    }
}
