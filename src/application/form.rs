// Config form controller - per-line editable draft and save lifecycle
use super::gateway::{FunnelError, FunnelGateway};
use crate::domain::line::{LineConfig, LineId, NightWindow, TimeOfDay};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long a successful-save confirmation stays visible.
pub const SAVED_SIGNAL_TTL: Duration = Duration::from_millis(1200);

/// Editable field state for one line, held the way the input widgets hold
/// it: free text for numeric and clock fields, booleans for checkboxes.
/// Values are only coerced to their semantic types when a save is
/// triggered.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub enabled: bool,
    pub base_latency_ms: String,
    pub jitter_ms: String,
    pub error_rate: String,
    pub timeout_rate: String,
    pub timeout_ms: String,
    pub night_block_enabled: bool,
    pub night_start: String,
    pub night_end: String,
}

impl FormDraft {
    fn from_config(cfg: &LineConfig) -> Self {
        Self {
            enabled: cfg.enabled,
            base_latency_ms: cfg.base_latency_ms.to_string(),
            jitter_ms: cfg.jitter_ms.to_string(),
            error_rate: cfg.error_rate.to_string(),
            timeout_rate: cfg.timeout_rate.to_string(),
            timeout_ms: cfg.timeout_ms.to_string(),
            night_block_enabled: cfg.night_block_enabled,
            night_start: cfg.night_block_window.start.to_string(),
            night_end: cfg.night_block_window.end.to_string(),
        }
    }
}

/// Operator-visible outcome of the latest save. A confirmation expires on
/// its own; a failure sticks until dismissed.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveSignal {
    Idle,
    Saved { until: Instant },
    Failed(String),
}

/// Result of one save round-trip, delivered back to the owning loop.
/// Carries the payload that was sent so the confirmed state can be
/// reconciled to it.
#[derive(Debug)]
pub struct SaveOutcome {
    pub line: LineId,
    pub result: Result<LineConfig, FunnelError>,
}

/// Binds one line's editable fields and owns its save lifecycle. One
/// instance per line, constructed at dashboard startup and never
/// recreated.
#[derive(Debug)]
pub struct ConfigFormController {
    line: LineId,
    name: String,
    draft: FormDraft,
    signal: SaveSignal,
    in_flight: Option<JoinHandle<()>>,
}

fn parse_u32(field: &'static str, raw: &str) -> Result<u32, FunnelError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| FunnelError::invalid_field(field, raw))
}

fn parse_f64(field: &'static str, raw: &str) -> Result<f64, FunnelError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FunnelError::invalid_field(field, raw))
}

fn parse_clock(field: &'static str, raw: &str) -> Result<TimeOfDay, FunnelError> {
    raw.trim()
        .parse::<TimeOfDay>()
        .map_err(|_| FunnelError::invalid_field(field, raw))
}

impl ConfigFormController {
    pub fn new(line: LineId, confirmed: &LineConfig) -> Self {
        Self {
            line,
            name: confirmed.name.clone(),
            draft: FormDraft::from_config(confirmed),
            signal: SaveSignal::Idle,
            in_flight: None,
        }
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    /// Display label; edited server-side only, round-tripped untouched.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut FormDraft {
        &mut self.draft
    }

    /// Coerce the current field values into a complete save payload. No
    /// range re-validation happens here — out-of-range numbers the
    /// widgets permit are forwarded as-is, the server is authoritative.
    /// Clock fields must parse as `HH:MM`.
    pub fn build_payload(&self) -> Result<LineConfig, FunnelError> {
        let d = &self.draft;
        Ok(LineConfig {
            name: self.name.clone(),
            enabled: d.enabled,
            base_latency_ms: parse_u32("base_latency_ms", &d.base_latency_ms)?,
            jitter_ms: parse_u32("jitter_ms", &d.jitter_ms)?,
            error_rate: parse_f64("error_rate", &d.error_rate)?,
            timeout_rate: parse_f64("timeout_rate", &d.timeout_rate)?,
            timeout_ms: parse_u32("timeout_ms", &d.timeout_ms)?,
            night_block_enabled: d.night_block_enabled,
            night_block_window: NightWindow {
                start: parse_clock("night_block_window.start", &d.night_start)?,
                end: parse_clock("night_block_window.end", &d.night_end)?,
            },
        })
    }

    /// Kick off a save of the full current draft. The round trip runs as
    /// its own task and reports back over `outcomes`; a second trigger
    /// while one is in flight starts independently and the last outcome
    /// to settle owns the signal. Coercion failures short-circuit without
    /// touching the network.
    pub fn trigger_save(
        &mut self,
        gateway: Arc<dyn FunnelGateway>,
        outcomes: mpsc::Sender<SaveOutcome>,
    ) {
        let payload = match self.build_payload() {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(line = %self.line, %err, "save rejected before send");
                self.signal = SaveSignal::Failed(err.to_string());
                return;
            }
        };
        let line = self.line;
        let handle = tokio::spawn(async move {
            let result = gateway
                .save_line(line, &payload)
                .await
                .map(|()| payload);
            let _ = outcomes.send(SaveOutcome { line, result }).await;
        });
        // Only the newest handle is kept for teardown; an older in-flight
        // save keeps running and is still honored server-side.
        self.in_flight = Some(handle);
    }

    /// Fold a settled save back into the signal state. Failed saves keep
    /// the draft exactly as the operator left it, ready for correction
    /// and resubmission.
    pub fn complete_save(&mut self, result: &Result<LineConfig, FunnelError>, now: Instant) {
        self.in_flight = None;
        match result {
            Ok(_) => {
                self.signal = SaveSignal::Saved {
                    until: now + SAVED_SIGNAL_TTL,
                };
            }
            Err(err) => {
                tracing::warn!(line = %self.line, %err, "save failed");
                self.signal = SaveSignal::Failed(err.to_string());
            }
        }
    }

    /// The signal as the operator should currently see it; an expired
    /// confirmation reads as idle.
    pub fn visible_signal(&self, now: Instant) -> SaveSignal {
        match &self.signal {
            SaveSignal::Saved { until } if now >= *until => SaveSignal::Idle,
            other => other.clone(),
        }
    }

    pub fn dismiss_signal(&mut self) {
        self.signal = SaveSignal::Idle;
    }

    /// Throw away local edits and rebind the draft to a server-side
    /// config (revert, or an external refresh).
    pub fn rebind(&mut self, confirmed: &LineConfig) {
        self.name = confirmed.name.clone();
        self.draft = FormDraft::from_config(confirmed);
    }

    /// Abandon an in-flight save on teardown so no request outlives the
    /// console session.
    pub fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{demo_config, StubGateway};

    fn controller() -> ConfigFormController {
        let config = demo_config();
        ConfigFormController::new(LineId::OuterUnified, &config[&LineId::OuterUnified])
    }

    #[test]
    fn test_draft_shows_exact_confirmed_values() {
        let form = controller();
        let d = form.draft();
        assert!(d.enabled);
        assert_eq!(d.base_latency_ms, "220");
        assert_eq!(d.jitter_ms, "80");
        assert_eq!(d.error_rate, "0.02");
        assert_eq!(d.timeout_rate, "0.01");
        assert_eq!(d.timeout_ms, "15000");
        assert_eq!(d.night_start, "00:30");
        assert_eq!(d.night_end, "06:00");
    }

    #[test]
    fn test_payload_coerces_text_to_types() {
        let mut form = controller();
        form.draft_mut().base_latency_ms = "250".to_string();
        form.draft_mut().error_rate = "0.5".to_string();
        let payload = form.build_payload().unwrap();
        assert_eq!(payload.base_latency_ms, 250);
        assert_eq!(payload.error_rate, 0.5);

        // the serialized field set is exactly the wire schema
        let value = serde_json::to_value(&payload).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(
            keys.len(),
            9,
            "payload must round-trip the full config: {keys:?}"
        );
        assert!(value["base_latency_ms"].is_u64(), "integer, not string");
    }

    #[test]
    fn test_payload_rejects_unparseable_number() {
        let mut form = controller();
        form.draft_mut().jitter_ms = "lots".to_string();
        match form.build_payload() {
            Err(FunnelError::InvalidField { field, .. }) => assert_eq!(field, "jitter_ms"),
            other => panic!("expected invalid field, got {other:?}"),
        }
    }

    #[test]
    fn test_payload_rejects_malformed_clock() {
        let mut form = controller();
        form.draft_mut().night_start = "1:30".to_string();
        match form.build_payload() {
            Err(FunnelError::InvalidField { field, .. }) => {
                assert_eq!(field, "night_block_window.start")
            }
            other => panic!("expected invalid field, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_confirmation_expires() {
        let gateway = Arc::new(StubGateway::with_config(demo_config()));
        let (tx, mut rx) = mpsc::channel(4);
        let mut form = controller();
        form.draft_mut().enabled = false;
        form.trigger_save(gateway.clone(), tx);

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.line, LineId::OuterUnified);
        let saved = outcome.result.as_ref().unwrap();
        assert!(!saved.enabled);
        assert_eq!(gateway.saved_payloads().len(), 1);

        let now = Instant::now();
        form.complete_save(&outcome.result, now);
        assert!(matches!(form.visible_signal(now), SaveSignal::Saved { .. }));
        assert_eq!(
            form.visible_signal(now + SAVED_SIGNAL_TTL),
            SaveSignal::Idle
        );
    }

    #[tokio::test]
    async fn test_failed_save_sticks_and_keeps_draft() {
        let gateway = Arc::new(StubGateway::with_config(demo_config()));
        gateway.set_fail_saves(true);
        let (tx, mut rx) = mpsc::channel(4);
        let mut form = controller();
        form.draft_mut().base_latency_ms = "777".to_string();
        form.trigger_save(gateway.clone(), tx);

        let outcome = rx.recv().await.unwrap();
        assert!(outcome.result.is_err());
        let now = Instant::now();
        form.complete_save(&outcome.result, now);

        // sticky long past the confirmation TTL, and no rollback
        assert!(matches!(
            form.visible_signal(now + Duration::from_secs(60)),
            SaveSignal::Failed(_)
        ));
        assert_eq!(form.draft().base_latency_ms, "777");

        form.dismiss_signal();
        assert_eq!(form.visible_signal(now), SaveSignal::Idle);
    }

    #[test]
    fn test_rebind_discards_edits() {
        let config = demo_config();
        let mut form = controller();
        form.draft_mut().timeout_ms = "1".to_string();
        form.rebind(&config[&LineId::OuterUnified]);
        assert_eq!(form.draft().timeout_ms, "15000");
    }
}
