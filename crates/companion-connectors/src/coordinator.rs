//! Keyed request coordination: one in-flight call per key, FIFO waiting, retries

use crate::error::ConnectorResult;
use crate::retry::{RetryDecision, RetryManager};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct KeyState {
    busy: bool,
    /// Callers waiting for the key, in arrival order
    queue: VecDeque<oneshot::Sender<()>>,
}

type KeyMap = Arc<Mutex<HashMap<String, KeyState>>>;

fn lock(keys: &KeyMap) -> MutexGuard<'_, HashMap<String, KeyState>> {
    keys.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Serializes calls that share a key and retries fast transient failures.
///
/// While a call for a key is in flight (including its retries), further calls
/// for the same key wait and then run one at a time in arrival order. Calls for
/// different keys never wait on each other.
#[derive(Debug, Clone, Default)]
pub struct RequestCoordinator {
    keys: KeyMap,
    retry: RetryManager,
}

impl RequestCoordinator {
    pub fn new(retry: RetryManager) -> Self {
        Self {
            keys: KeyMap::default(),
            retry,
        }
    }

    /// Run `operation` under `key`, retrying it as the retry policy allows.
    ///
    /// The key stays held across retries, so queued callers only start once this
    /// call has finally succeeded or failed. The retry window is measured per
    /// attempt.
    pub async fn run<T, F, Fut>(&self, key: &str, mut operation: F) -> ConnectorResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ConnectorResult<T>>,
    {
        let _turn = self.acquire(key).await;
        let mut retries = 0;

        loop {
            let start = Instant::now();
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match self.retry.should_retry(&error, retries, start) {
                RetryDecision::Retry { delay, attempt } => {
                    tracing::warn!(
                        key = %key,
                        attempt,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        error = %error,
                        "Transient failure, retrying"
                    );
                    retries = attempt;
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Stop { reason, total_elapsed } => {
                    tracing::debug!(
                        key = %key,
                        retries,
                        elapsed_ms = total_elapsed.as_millis() as u64,
                        reason = %reason,
                        "Giving up on request"
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Whether a call for `key` is currently in flight
    pub fn is_busy(&self, key: &str) -> bool {
        lock(&self.keys).get(key).is_some_and(|state| state.busy)
    }

    async fn acquire(&self, key: &str) -> Turn {
        loop {
            let receiver = {
                let mut keys = lock(&self.keys);
                let state = keys.entry(key.to_string()).or_default();
                if !state.busy {
                    state.busy = true;
                    return Turn::held(self.keys.clone(), key);
                }
                let (sender, receiver) = oneshot::channel();
                state.queue.push_back(sender);
                receiver
            };

            tracing::debug!(key = %key, "Key busy, queued");
            let mut turn = Turn::waiting(self.keys.clone(), key, receiver);
            if turn.wait().await {
                return turn;
            }
        }
    }
}

/// Ownership of a key, or a place in its queue.
///
/// Dropping a held turn passes the key to the next live waiter. Dropping a
/// waiting turn that was handed the key in the meantime does the same, so an
/// abandoned caller never leaves a key stuck.
struct Turn {
    keys: KeyMap,
    key: String,
    pending: Option<oneshot::Receiver<()>>,
    /// Cleared once it is known this turn will never own the key
    owns_or_may_own: bool,
}

impl Turn {
    fn held(keys: KeyMap, key: &str) -> Self {
        Self {
            keys,
            key: key.to_string(),
            pending: None,
            owns_or_may_own: true,
        }
    }

    fn waiting(keys: KeyMap, key: &str, receiver: oneshot::Receiver<()>) -> Self {
        Self {
            keys,
            key: key.to_string(),
            pending: Some(receiver),
            owns_or_may_own: true,
        }
    }

    /// Wait to be handed the key; false if the sender vanished without handing over
    async fn wait(&mut self) -> bool {
        let Some(receiver) = self.pending.as_mut() else {
            return true;
        };
        let handed_over = receiver.await.is_ok();
        self.pending = None;
        self.owns_or_may_own = handed_over;
        handed_over
    }
}

impl Drop for Turn {
    fn drop(&mut self) {
        if !self.owns_or_may_own {
            return;
        }
        if let Some(mut receiver) = self.pending.take() {
            receiver.close();
            if receiver.try_recv().is_err() {
                return;
            }
        }
        release(&self.keys, &self.key);
    }
}

fn release(keys: &KeyMap, key: &str) {
    let mut keys = lock(keys);
    let Some(state) = keys.get_mut(key) else {
        return;
    };
    while let Some(next) = state.queue.pop_front() {
        // a send fails only when that waiter has gone away
        if next.send(()).is_ok() {
            return;
        }
    }
    keys.remove(key);
}
