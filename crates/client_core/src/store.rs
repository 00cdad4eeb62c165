use std::{fmt, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::protocol::{RequestDescriptor, RequestResult, FAILURE_MESSAGE};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{info, warn};

use crate::executor::RequestExecutor;

/// Status that moves a store to the loaded state; every other status is a failure.
const LOADED_STATUS: u16 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreId(pub String);

impl From<&str> for StoreId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for StoreId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Observable state of one resource.
///
/// Starts as `loading = true` with no items and no error. A successful fetch
/// fills `items` and clears `loading`; a failed one sets `error` and leaves
/// `loading` untouched, so a failed store keeps reporting `loading = true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceState<T> {
    pub items: Vec<T>,
    pub error: Option<String>,
    pub loading: bool,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            error: None,
            loading: true,
        }
    }
}

/// Holder of `{items, error, loading}` for one endpoint, fetched exactly once.
///
/// Stores are only created through [`ResourceStore::load`] or
/// [`ResourceStore::spawn`], each of which issues the single request. There is
/// no refresh; build a new store to fetch again.
pub struct ResourceStore<T> {
    id: StoreId,
    descriptor: RequestDescriptor,
    state: watch::Sender<ResourceState<T>>,
}

impl<T> ResourceStore<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn pending(id: StoreId, descriptor: RequestDescriptor) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            id,
            descriptor,
            state,
        }
    }

    /// Creates the store and waits for its fetch to be applied.
    pub async fn load<E>(
        id: impl Into<StoreId>,
        descriptor: RequestDescriptor,
        executor: &E,
    ) -> Self
    where
        E: RequestExecutor + ?Sized,
    {
        let store = Self::pending(id.into(), descriptor);
        let result = executor.execute(&store.descriptor).await;
        store.apply(result);
        store
    }

    /// Creates the store in its loading state and applies the fetch from a background task.
    pub fn spawn(
        id: impl Into<StoreId>,
        descriptor: RequestDescriptor,
        executor: Arc<dyn RequestExecutor>,
    ) -> Arc<Self> {
        let store = Arc::new(Self::pending(id.into(), descriptor));
        let task_store = Arc::clone(&store);
        tokio::spawn(async move {
            let result = executor.execute(&task_store.descriptor).await;
            task_store.apply(result);
        });
        store
    }

    fn apply(&self, result: RequestResult) {
        if result.status != LOADED_STATUS {
            warn!(
                store = %self.id,
                status = result.status,
                "store: fetch failed"
            );
            let message = result.message();
            self.state.send_modify(|state| state.error = Some(message));
            return;
        }

        match decode_items::<T>(result.data) {
            Ok(items) => {
                info!(store = %self.id, count = items.len(), "store: loaded");
                self.state.send_modify(|state| {
                    state.items = items;
                    state.loading = false;
                });
            }
            Err(error) => {
                warn!(
                    store = %self.id,
                    %error,
                    "store: response body does not match the resource shape"
                );
                self.state
                    .send_modify(|state| state.error = Some(FAILURE_MESSAGE.to_string()));
            }
        }
    }

    pub fn id(&self) -> &StoreId {
        &self.id
    }

    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().items.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn snapshot(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    /// Stream yielding the current state, then each change.
    pub fn changes(&self) -> WatchStream<ResourceState<T>> {
        WatchStream::new(self.state.subscribe())
    }
}

/// Some backends serialise their list into a JSON string; both forms are accepted.
fn decode_items<T: DeserializeOwned>(data: Value) -> serde_json::Result<Vec<T>> {
    match data {
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
