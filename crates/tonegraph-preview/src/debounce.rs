//! Trailing-edge debouncing of asynchronous work.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::ScheduleError;

/// Runs only the most recent task once `delay` has passed without another
/// call.
///
/// A call made while an earlier task is still waiting cancels that task and
/// restarts the window. Once a task's window has elapsed it is detached onto
/// the runtime and can no longer be cancelled.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `task`, replacing any task still waiting for its window.
    pub fn call<F>(&self, task: F) -> Result<(), ScheduleError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.call_with(move || task)
    }

    /// Like [`Debouncer::call`], but the task is built by `make` when the
    /// window elapses, right before it is spawned. Work done in `make` is
    /// visible before the debouncer stops reporting itself as pending.
    pub fn call_with<M, F>(&self, make: M) -> Result<(), ScheduleError>
    where
        M: FnOnce() -> F + Send + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| ScheduleError::NoRuntime)?;
        let delay = self.delay;
        let spawner = runtime.clone();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so that a later cancel cannot interrupt it.
            spawner.spawn(make());
        });
        if let Some(previous) = self.pending.lock().replace(handle) {
            if !previous.is_finished() {
                tracing::debug!(delay = ?delay, "debounce window restarted");
            }
            previous.abort();
        }
        Ok(())
    }

    /// Cancels the task waiting for its window, if any. Returns whether
    /// something was cancelled.
    pub fn cancel(&self) -> bool {
        match self.pending.lock().take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a task is still waiting for its window.
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
