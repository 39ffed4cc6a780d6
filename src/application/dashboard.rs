// Dashboard controller - composition, startup ordering and global reset
use super::config_store::LineConfigStore;
use super::form::{ConfigFormController, SaveOutcome};
use super::gateway::{FunnelError, FunnelGateway};
use super::poller::{MetricsPoller, PollerHandle};
use crate::domain::line::{LineConfig, LineId};
use crate::domain::metrics::MetricsSnapshot;
use crate::presentation::chart::TimeSeriesChart;
use crate::presentation::surface::DrawSurface;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Composes the console: configuration is loaded and one form + one
/// chart exist per line before the poll loop may start. All per-line
/// objects live in `LineId`-keyed maps built once at startup.
pub struct DashboardController {
    gateway: Arc<dyn FunnelGateway>,
    store: LineConfigStore,
    forms: HashMap<LineId, ConfigFormController>,
    charts: HashMap<LineId, TimeSeriesChart>,
    latest: Option<MetricsSnapshot>,
    outcomes_tx: mpsc::Sender<SaveOutcome>,
    outcomes_rx: Option<mpsc::Receiver<SaveOutcome>>,
    reset_in_flight: Option<JoinHandle<()>>,
}

impl DashboardController {
    /// Load configuration and build the per-line controllers. A load
    /// failure here is fatal — no partial dashboard is ever rendered.
    pub async fn start(gateway: Arc<dyn FunnelGateway>) -> Result<Self, FunnelError> {
        let store = LineConfigStore::load(gateway.as_ref()).await?;
        let forms = LineId::ALL
            .into_iter()
            .map(|id| (id, ConfigFormController::new(id, store.confirmed(id))))
            .collect();
        let charts = LineId::ALL
            .into_iter()
            .map(|id| (id, TimeSeriesChart::new(id)))
            .collect();
        let (outcomes_tx, outcomes_rx) = mpsc::channel(16);
        Ok(Self {
            gateway,
            store,
            forms,
            charts,
            latest: None,
            outcomes_tx,
            outcomes_rx: Some(outcomes_rx),
            reset_in_flight: None,
        })
    }

    /// Start the poll loop. Callable only once the controller exists,
    /// which is what guarantees a chart per line before the first tick.
    pub fn spawn_poller(&self, cadence: Duration) -> (PollerHandle, mpsc::Receiver<MetricsSnapshot>) {
        let (tx, rx) = mpsc::channel(8);
        let handle = MetricsPoller::new(self.gateway.clone(), cadence).spawn(tx);
        (handle, rx)
    }

    /// Receiver for settled save round-trips; taken once by the event loop.
    pub fn take_save_outcomes(&mut self) -> mpsc::Receiver<SaveOutcome> {
        self.outcomes_rx.take().expect("save outcomes taken once")
    }

    pub fn form(&self, id: LineId) -> &ConfigFormController {
        &self.forms[&id]
    }

    pub fn form_mut(&mut self, id: LineId) -> &mut ConfigFormController {
        self.forms.get_mut(&id).expect("a form exists per known line")
    }

    pub fn confirmed(&self, id: LineId) -> &LineConfig {
        self.store.confirmed(id)
    }

    pub fn latest_snapshot(&self) -> Option<&MetricsSnapshot> {
        self.latest.as_ref()
    }

    /// A delivered snapshot replaces the previous one wholesale; frames
    /// between ticks keep redrawing the last successful one.
    pub fn apply_snapshot(&mut self, snapshot: MetricsSnapshot) {
        self.latest = Some(snapshot);
    }

    /// Redraw one line's chart from the latest snapshot. No snapshot yet
    /// means nothing is drawn.
    pub fn draw_chart(&self, id: LineId, surface: &mut dyn DrawSurface) {
        let Some(snapshot) = self.latest.as_ref() else {
            return;
        };
        if let Some(series) = snapshot.series_for(id) {
            self.charts[&id].draw(surface, series);
        }
    }

    pub fn trigger_save(&mut self, id: LineId) {
        let gateway = self.gateway.clone();
        let outcomes = self.outcomes_tx.clone();
        self.form_mut(id).trigger_save(gateway, outcomes);
    }

    /// Fold a settled save back in: a success reconciles the confirmed
    /// state to the payload that was sent; either way the form owns the
    /// operator-visible signal. One line's outcome never touches another
    /// line.
    pub fn handle_save_outcome(&mut self, outcome: SaveOutcome, now: Instant) {
        if let Ok(saved) = &outcome.result {
            self.store.reconcile(outcome.line, saved.clone());
        }
        self.form_mut(outcome.line).complete_save(&outcome.result, now);
    }

    /// Drop local edits for one line and rebind its form to the server's
    /// current state.
    pub async fn revert_line(&mut self, id: LineId) -> Result<(), FunnelError> {
        let fresh = self.gateway.fetch_line(id).await?;
        self.store.reconcile(id, fresh.clone());
        self.form_mut(id).rebind(&fresh);
        Ok(())
    }

    /// Fire the global reset. No local state changes — the next poll
    /// tick naturally reflects the post-reset metrics, and configuration
    /// is unaffected. The outcome is only logged.
    pub fn trigger_reset(&mut self) {
        let gateway = self.gateway.clone();
        let handle = tokio::spawn(async move {
            match gateway.reset_metrics().await {
                Ok(()) => tracing::info!("metrics reset accepted"),
                Err(err) => tracing::warn!(%err, "metrics reset failed"),
            }
        });
        self.reset_in_flight = Some(handle);
    }

    /// Abandon all in-flight work on session end.
    pub fn teardown(&mut self) {
        for form in self.forms.values_mut() {
            form.abort_in_flight();
        }
        if let Some(handle) = self.reset_in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{demo_config, demo_snapshot, StubGateway};
    use crate::presentation::surface::RecordingSurface;
    use std::sync::atomic::Ordering;

    async fn dashboard(gateway: Arc<StubGateway>) -> DashboardController {
        DashboardController::start(gateway).await.unwrap()
    }

    #[tokio::test]
    async fn test_start_builds_a_form_per_line_with_fetched_values() {
        let dash = dashboard(Arc::new(StubGateway::with_config(demo_config()))).await;
        for id in LineId::ALL {
            let form = dash.form(id);
            assert_eq!(form.name(), id.to_string());
            assert_eq!(form.draft().timeout_ms, "15000");
        }
    }

    #[tokio::test]
    async fn test_start_is_fatal_on_partial_config() {
        let mut config = demo_config();
        config.remove(&LineId::OuterUnified);
        let result = DashboardController::start(Arc::new(StubGateway::with_config(config))).await;
        assert!(matches!(result, Err(FunnelError::ContractViolation(_))));
    }

    #[tokio::test]
    async fn test_save_outcome_reconciles_store() {
        let gateway = Arc::new(StubGateway::with_config(demo_config()));
        let mut dash = dashboard(gateway.clone()).await;
        let mut rx = dash.take_save_outcomes();

        dash.form_mut(LineId::OuterUnified).draft_mut().enabled = false;
        dash.trigger_save(LineId::OuterUnified);
        let outcome = rx.recv().await.unwrap();
        dash.handle_save_outcome(outcome, Instant::now());

        assert!(!dash.confirmed(LineId::OuterUnified).enabled);
        // save is a full-state overwrite of exactly one line
        let saved = gateway.saved_payloads();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, LineId::OuterUnified);
        assert!(dash.confirmed(LineId::InnerUnified).enabled);
    }

    #[tokio::test]
    async fn test_double_save_is_idempotent() {
        let gateway = Arc::new(StubGateway::with_config(demo_config()));
        let mut dash = dashboard(gateway.clone()).await;
        let mut rx = dash.take_save_outcomes();

        for _ in 0..2 {
            dash.trigger_save(LineId::InnerZf);
            let outcome = rx.recv().await.unwrap();
            assert!(outcome.result.is_ok());
            dash.handle_save_outcome(outcome, Instant::now());
        }
        let saved = gateway.saved_payloads();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].1, saved[1].1);
        assert_eq!(&saved[1].1, dash.confirmed(LineId::InnerZf));
    }

    #[tokio::test]
    async fn test_reset_touches_no_config() {
        let gateway = Arc::new(StubGateway::with_config(demo_config()));
        let mut dash = dashboard(gateway.clone()).await;
        let before: Vec<_> = LineId::ALL.iter().map(|&id| dash.confirmed(id).clone()).collect();

        dash.trigger_reset();
        // let the spawned request land
        tokio::task::yield_now().await;
        for _ in 0..10 {
            if gateway.resets.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(gateway.resets.load(Ordering::SeqCst), 1);

        let after: Vec<_> = LineId::ALL.iter().map(|&id| dash.confirmed(id).clone()).collect();
        assert_eq!(before, after);
        dash.teardown();
    }

    #[tokio::test]
    async fn test_charts_keep_last_frame_until_a_snapshot_arrives() {
        let mut dash = dashboard(Arc::new(StubGateway::with_config(demo_config()))).await;

        // nothing drawn before the first successful tick
        let mut surface = RecordingSurface::new();
        dash.draw_chart(LineId::OuterUnified, &mut surface);
        assert!(surface.commands().is_empty());

        dash.apply_snapshot(demo_snapshot());
        let mut surface = RecordingSurface::new();
        dash.draw_chart(LineId::OuterUnified, &mut surface);
        assert!(!surface.commands().is_empty());
    }

    #[tokio::test]
    async fn test_revert_discards_local_edits() {
        let gateway = Arc::new(StubGateway::with_config(demo_config()));
        let mut dash = dashboard(gateway).await;
        dash.form_mut(LineId::OuterZf).draft_mut().jitter_ms = "9".into();
        dash.revert_line(LineId::OuterZf).await.unwrap();
        assert_eq!(dash.form(LineId::OuterZf).draft().jitter_ms, "80");
    }
}
