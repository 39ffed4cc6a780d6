// Gateway trait for the traffic-controller admin/metrics API
use crate::domain::line::{LineConfig, LineId};
use crate::domain::metrics::MetricsSnapshot;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Everything that can go wrong talking to the controller, and the one
/// client-side failure (field coercion) that shares the save path.
///
/// Propagation rules: config-load failures are fatal to startup, save
/// failures stay local to one line's form, and poll-tick failures are
/// logged and skipped.
#[derive(Debug, Error)]
pub enum FunnelError {
    #[error("transport failure: {0}")]
    Fetch(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("malformed response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("response is missing line {0}")]
    ContractViolation(LineId),

    #[error("field {field} does not parse: {value:?}")]
    InvalidField { field: &'static str, value: String },
}

impl FunnelError {
    pub fn invalid_field(field: &'static str, value: &str) -> Self {
        FunnelError::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}

#[async_trait]
pub trait FunnelGateway: Send + Sync {
    /// Fetch the full per-line configuration (`GET /admin/config`).
    async fn fetch_config(&self) -> Result<HashMap<LineId, LineConfig>, FunnelError>;

    /// Fetch one line's current configuration (`GET /admin/line/{id}`).
    async fn fetch_line(&self, id: LineId) -> Result<LineConfig, FunnelError>;

    /// Persist one line's full configuration (`POST /admin/line/{id}`).
    /// The response body, if any, is not consumed.
    async fn save_line(&self, id: LineId, config: &LineConfig) -> Result<(), FunnelError>;

    /// Fetch the current metrics snapshot for all lines (`GET /metrics/snapshot`).
    async fn fetch_snapshot(&self) -> Result<MetricsSnapshot, FunnelError>;

    /// Reset the backend's simulated metrics (`POST /admin/reset`, empty
    /// body). Never touches persisted line configuration.
    async fn reset_metrics(&self) -> Result<(), FunnelError>;
}
