// Application layer - stores, controllers and the polling loop
pub mod config_store;
pub mod dashboard;
pub mod form;
pub mod gateway;
pub mod poller;

#[cfg(test)]
pub(crate) mod testing {
    use super::gateway::{FunnelError, FunnelGateway};
    use crate::domain::line::{LineConfig, LineId, NightWindow};
    use crate::domain::metrics::MetricsSnapshot;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Per-line defaults mirroring the backend's shipped configuration,
    /// handy as a fixture.
    pub fn demo_config() -> HashMap<LineId, LineConfig> {
        let window = NightWindow {
            start: "00:30".parse().unwrap(),
            end: "06:00".parse().unwrap(),
        };
        LineId::ALL
            .into_iter()
            .map(|id| {
                let inner = matches!(id, LineId::InnerUnified | LineId::InnerZf);
                let cfg = LineConfig {
                    name: id.to_string(),
                    enabled: true,
                    base_latency_ms: if inner { 80 } else { 220 },
                    jitter_ms: if inner { 40 } else { 80 },
                    error_rate: 0.02,
                    timeout_rate: 0.01,
                    timeout_ms: 15000,
                    night_block_enabled: inner,
                    night_block_window: window,
                };
                (id, cfg)
            })
            .collect()
    }

    /// An aligned three-sample snapshot covering every line.
    pub fn demo_snapshot() -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();
        for id in LineId::ALL {
            snapshot.series.insert(
                id,
                crate::domain::metrics::LineSeries {
                    sec: vec![10, 11, 12],
                    rps: vec![1.0, 5.0, 3.0],
                    latency_avg: vec![10.0, 20.0, 15.0],
                    ..Default::default()
                },
            );
        }
        snapshot
    }

    /// In-memory gateway double recording calls and replaying scripted
    /// responses.
    pub struct StubGateway {
        pub config: Mutex<HashMap<LineId, LineConfig>>,
        pub saved: Mutex<Vec<(LineId, LineConfig)>>,
        pub fail_saves: Mutex<bool>,
        /// Scripted snapshot ticks; `Err(status)` simulates a failing
        /// fetch, an empty queue replays `demo_snapshot`.
        pub snapshots: Mutex<VecDeque<Result<MetricsSnapshot, StatusCode>>>,
        pub resets: AtomicUsize,
    }

    impl StubGateway {
        pub fn with_config(config: HashMap<LineId, LineConfig>) -> Self {
            Self {
                config: Mutex::new(config),
                saved: Mutex::new(Vec::new()),
                fail_saves: Mutex::new(false),
                snapshots: Mutex::new(VecDeque::new()),
                resets: AtomicUsize::new(0),
            }
        }

        pub fn set_fail_saves(&self, fail: bool) {
            *self.fail_saves.lock().unwrap() = fail;
        }

        pub fn script_snapshot(&self, tick: Result<MetricsSnapshot, StatusCode>) {
            self.snapshots.lock().unwrap().push_back(tick);
        }

        pub fn saved_payloads(&self) -> Vec<(LineId, LineConfig)> {
            self.saved.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FunnelGateway for StubGateway {
        async fn fetch_config(&self) -> Result<HashMap<LineId, LineConfig>, FunnelError> {
            Ok(self.config.lock().unwrap().clone())
        }

        async fn fetch_line(&self, id: LineId) -> Result<LineConfig, FunnelError> {
            self.config
                .lock()
                .unwrap()
                .get(&id)
                .cloned()
                .ok_or(FunnelError::HttpStatus(StatusCode::NOT_FOUND))
        }

        async fn save_line(&self, id: LineId, config: &LineConfig) -> Result<(), FunnelError> {
            if *self.fail_saves.lock().unwrap() {
                return Err(FunnelError::HttpStatus(StatusCode::INTERNAL_SERVER_ERROR));
            }
            self.saved.lock().unwrap().push((id, config.clone()));
            self.config.lock().unwrap().insert(id, config.clone());
            Ok(())
        }

        async fn fetch_snapshot(&self) -> Result<MetricsSnapshot, FunnelError> {
            match self.snapshots.lock().unwrap().pop_front() {
                Some(Ok(snapshot)) => Ok(snapshot),
                Some(Err(status)) => Err(FunnelError::HttpStatus(status)),
                None => Ok(demo_snapshot()),
            }
        }

        async fn reset_metrics(&self) -> Result<(), FunnelError> {
            self.resets.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
