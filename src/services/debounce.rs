use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs only the last of a burst of triggers
///
/// Each trigger schedules its job after `delay`; a newer trigger within
/// that window cancels the pending one. Jobs that already started run to
/// completion. Used for SPA navigation, where the
/// page needs a moment to settle before it is analyzed.
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

    pub fn trigger<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Detached so a later trigger cannot cancel a job already running.
            tokio::spawn(job);
        });

        let previous = match self.pending.lock() {
            Ok(mut pending) => pending.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            if !previous.is_finished() {
                tracing::debug!("Superseded pending page analysis");
            }
            previous.abort();
        }
    }
}
