use std::sync::Arc;
use std::time::Duration;

use auth::Clock;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio::time::MissedTickBehavior;

use crate::domain::token::errors::TokenError;
use crate::domain::token::ports::TokenRepository;

/// Shortest sweep period; `tokio::time::interval` rejects a zero period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic sweep that deletes token records past their expiry.
///
/// This is the only garbage collection path for confirmation codes and
/// stale refresh tokens. Deletion is keyed on expiry alone, so a sweep may
/// overlap with issuance and consumption.
pub struct ExpiryReaper<TR>
where
    TR: TokenRepository,
{
    repository: Arc<TR>,
    clock: Arc<dyn Clock>,
}

impl<TR> ExpiryReaper<TR>
where
    TR: TokenRepository,
{
    pub fn new(repository: Arc<TR>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Run one sweep: delete every token whose expiry lies before now.
    ///
    /// # Returns
    /// Number of token records removed
    pub async fn sweep(&self) -> Result<u64, TokenError> {
        let now = self.clock.now();
        let removed = self.repository.delete_expired(now).await?;

        tracing::debug!(removed, cutoff = %now, "Expired tokens swept");

        Ok(removed)
    }

    /// Spawn the sweep loop on the current runtime.
    ///
    /// The first sweep runs immediately, then once per `period`. Failed
    /// sweeps are logged and the loop keeps going. A zero `period` is
    /// raised to one millisecond.
    pub fn start(self: Arc<Self>, period: Duration) -> ReaperHandle {
        let period = period.max(MIN_PERIOD);
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(interval_secs = period.as_secs(), "Expiry reaper started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = timer.tick() => {
                        if let Err(e) = self.sweep().await {
                            tracing::error!(error = %e, "Expiry sweep failed, will retry on next interval");
                        }
                    }
                }
            }

            tracing::info!("Expiry reaper stopped");
        });

        ReaperHandle {
            shutdown: Some(shutdown_tx),
            task,
        }
    }
}

/// Handle to a running reaper loop.
pub struct ReaperHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ReaperHandle {
    /// Signal the loop to exit and wait for it.
    ///
    /// A sweep already in flight finishes first.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Err(e) = (&mut self.task).await {
            tracing::error!(error = %e, "Expiry reaper task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
