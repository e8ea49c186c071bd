//! Debounced persistence scheduling.
//!
//! Every request cancels the previous unfired task and arms a new one, so a
//! burst of mutations collapses into a single write once the burst goes quiet.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::error::AccountsError;

/// Default quiet period before a scheduled write runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Capability handed to every account so its own changes can request a write.
pub type PersistCallback = Arc<dyn Fn() + Send + Sync>;

/// A callback that does nothing, for accounts that live outside a registry.
pub fn noop() -> PersistCallback {
    Arc::new(|| {})
}

/// Outcome of a fired persistence task, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistEvent {
    Saved { accounts: usize },
    Failed(String),
}

pub struct Debouncer {
    runtime: Handle,
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Bind to the tokio runtime of the calling context.
    pub fn new(delay: Duration) -> Result<Self, AccountsError> {
        let runtime = Handle::try_current().map_err(|_| AccountsError::RuntimeUnavailable)?;
        Ok(Self {
            runtime,
            delay,
            pending: Mutex::new(None),
        })
    }

    /// Abort any unfired task and run `job` once `delay` has elapsed.
    pub fn schedule<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.take() {
            previous.abort();
        }

        let delay = self.delay;
        *pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            job();
        }));
    }

    /// Abort the pending task. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once() {
        let debouncer = Debouncer::new(Duration::from_millis(100)).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let runs = runs.clone();
            debouncer.schedule(move || {
                runs.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert!(debouncer.is_pending());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let debouncer = Debouncer::new(DEFAULT_DEBOUNCE).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        debouncer.schedule(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_requires_runtime() {
        assert!(matches!(
            Debouncer::new(DEFAULT_DEBOUNCE),
            Err(AccountsError::RuntimeUnavailable)
        ));
    }
}
