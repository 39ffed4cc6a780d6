// Metrics domain model - per-line time series and cumulative totals
use super::line::LineId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One line's windowed series as the backend reports them. The three core
/// sequences are index-aligned: index i describes the same second across
/// `sec`, `rps` and `latency_avg`. The outcome breakdowns ride along on
/// the same index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub sec: Vec<i64>,
    pub rps: Vec<f64>,
    pub latency_avg: Vec<f64>,
    #[serde(default)]
    pub success: Vec<u32>,
    #[serde(default)]
    pub errors: Vec<u32>,
    #[serde(default)]
    pub timeouts: Vec<u32>,
}

impl LineSeries {
    pub fn len(&self) -> usize {
        self.sec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sec.is_empty()
    }

    /// Checks the index-alignment invariant on the core sequences; the
    /// outcome breakdowns are only checked when present.
    pub fn is_aligned(&self) -> bool {
        let n = self.sec.len();
        self.rps.len() == n
            && self.latency_avg.len() == n
            && (self.success.is_empty() || self.success.len() == n)
            && (self.errors.is_empty() || self.errors.len() == n)
            && (self.timeouts.is_empty() || self.timeouts.len() == n)
    }
}

/// Cumulative counters since the last reset, with latency percentiles
/// over the backend's sample ring. Percentiles are -1 while no samples
/// have been recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineTotals {
    pub requests: u64,
    pub success: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub p50_ms: i64,
    pub p95_ms: i64,
    pub p99_ms: i64,
}

/// One poll's full view of every line. Transient: consumed by the next
/// redraw and replaced wholesale by the next tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub series: HashMap<LineId, LineSeries>,
    #[serde(default)]
    pub totals: HashMap<LineId, LineTotals>,
}

impl MetricsSnapshot {
    /// First known line missing from the series map, if any. A missing
    /// key for a known line is a contract violation on the backend side.
    pub fn missing_line(&self) -> Option<LineId> {
        LineId::ALL.into_iter().find(|id| !self.series.contains_key(id))
    }

    pub fn series_for(&self, id: LineId) -> Option<&LineSeries> {
        self.series.get(&id)
    }

    pub fn totals_for(&self, id: LineId) -> Option<&LineTotals> {
        self.totals.get(&id)
    }
}
