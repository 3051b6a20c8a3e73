use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to a running background sweep.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct SweepHandle {
    inner: Option<JoinHandle<()>>,
    stop_tx: Option<oneshot::Sender<()>>,
}

impl SweepHandle {
    /// Spawn `tick` on `runtime` every `every`.
    ///
    /// The first run happens one full interval after spawning. The task ends
    /// when stopped or when `tick` returns `false`.
    pub(crate) fn spawn<F>(runtime: &tokio::runtime::Handle, every: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if !tick() {
                            break;
                        }
                    }
                }
            }
        });
        Self {
            inner: Some(task),
            stop_tx: Some(stop_tx),
        }
    }

    /// Whether the sweep task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.inner.as_ref().is_none_or(JoinHandle::is_finished)
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Gracefully stop the task and wait for it to exit.
    pub async fn stop(mut self) {
        self.signal_stop();
        if let Some(task) = self.inner.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweepHandle {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(task) = self.inner.take()
            && !task.is_finished()
        {
            task.abort();
        }
    }
}
