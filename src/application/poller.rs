// Metrics poller - self-scheduling snapshot loop
use super::gateway::FunnelGateway;
use crate::domain::metrics::MetricsSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

pub const DEFAULT_CADENCE: Duration = Duration::from_secs(1);

/// Periodically fetches one snapshot covering all lines and hands it to
/// the rendering side. The cadence is measured from the completion of
/// the previous cycle, so in-flight polls never overlap. Any tick
/// failure is logged and skipped — the dashboard stays live, the next
/// tick is scheduled regardless.
pub struct MetricsPoller {
    gateway: Arc<dyn FunnelGateway>,
    cadence: Duration,
}

/// Owner-side handle to a running poll loop; dropping the console stops
/// the loop instead of leaking it.
pub struct PollerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn stop(self) {
        let _ = self.stop.send(true);
        self.task.abort();
    }
}

impl MetricsPoller {
    pub fn new(gateway: Arc<dyn FunnelGateway>, cadence: Duration) -> Self {
        Self { gateway, cadence }
    }

    /// One poll cycle. Returns `None` when the tick is skipped: transport
    /// or decode failure, or a snapshot missing a known line (same
    /// treatment — skip, retry next tick).
    pub async fn tick(&self) -> Option<MetricsSnapshot> {
        match self.gateway.fetch_snapshot().await {
            Ok(snapshot) => {
                if let Some(missing) = snapshot.missing_line() {
                    tracing::warn!(line = %missing, "snapshot missing a known line, tick skipped");
                    return None;
                }
                Some(snapshot)
            }
            Err(err) => {
                tracing::warn!(%err, "metrics tick failed, tick skipped");
                None
            }
        }
    }

    /// Run the loop until the receiver goes away or the handle stops it.
    pub fn spawn(self, snapshots: mpsc::Sender<MetricsSnapshot>) -> PollerHandle {
        let (stop, mut stopped) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                if let Some(snapshot) = self.tick().await {
                    if snapshots.send(snapshot).await.is_err() {
                        break;
                    }
                }
                tokio::select! {
                    _ = tokio::time::sleep(self.cadence) => {}
                    _ = stopped.changed() => break,
                }
            }
        });
        PollerHandle { stop, task }
    }
}
