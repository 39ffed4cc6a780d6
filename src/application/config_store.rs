// Line configuration store - last-confirmed server state per line
use super::gateway::{FunnelError, FunnelGateway};
use crate::domain::line::{LineConfig, LineId};
use std::collections::HashMap;

/// Holds the last configuration the server confirmed for each line.
///
/// The store is populated once at startup and entries live for the whole
/// session; they are only overwritten by `reconcile` after a save
/// succeeds. The store itself never issues writes — those belong to the
/// per-line form controllers, so one line's save failure cannot corrupt
/// another line's view.
#[derive(Debug)]
pub struct LineConfigStore {
    lines: HashMap<LineId, LineConfig>,
}

impl LineConfigStore {
    /// Single-attempt load of the full configuration. Any failure is the
    /// caller's problem (startup treats it as fatal); a known line
    /// missing from the response is a contract violation.
    pub async fn load(gateway: &dyn FunnelGateway) -> Result<Self, FunnelError> {
        let lines = gateway.fetch_config().await?;
        if let Some(missing) = LineId::ALL.into_iter().find(|id| !lines.contains_key(id)) {
            return Err(FunnelError::ContractViolation(missing));
        }
        tracing::info!(lines = lines.len(), "configuration loaded");
        Ok(Self { lines })
    }

    /// The last server-confirmed configuration for a line. Every known
    /// line is present from `load` onward.
    pub fn confirmed(&self, id: LineId) -> &LineConfig {
        self.lines
            .get(&id)
            .expect("store holds every known line after load")
    }

    /// Overwrite a line's confirmed state with the payload of a save
    /// that the server accepted.
    pub fn reconcile(&mut self, id: LineId, saved: LineConfig) {
        tracing::debug!(line = %id, "reconciling confirmed config after save");
        self.lines.insert(id, saved);
    }
}
