// Line domain model - identifiers, clock window and per-line fault config
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of traffic lines the controller serves. The set is fixed
/// at build time and must match the keys the backend returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LineId {
    #[serde(rename = "outer-unified")]
    OuterUnified,
    #[serde(rename = "inner-unified")]
    InnerUnified,
    #[serde(rename = "outer-zf")]
    OuterZf,
    #[serde(rename = "inner-zf")]
    InnerZf,
}

impl LineId {
    /// Display/iteration order for the console.
    pub const ALL: [LineId; 4] = [
        LineId::OuterUnified,
        LineId::InnerUnified,
        LineId::OuterZf,
        LineId::InnerZf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineId::OuterUnified => "outer-unified",
            LineId::InnerUnified => "inner-unified",
            LineId::OuterZf => "outer-zf",
            LineId::InnerZf => "inner-zf",
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown line id: {0}")]
pub struct UnknownLine(pub String);

impl FromStr for LineId {
    type Err = UnknownLine;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LineId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownLine(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid HH:MM time: {0:?}")]
pub struct InvalidTimeOfDay(pub String);

/// Wall-clock minute of day, parsed strictly from `HH:MM` (24h).
///
/// Malformed input is rejected at the boundary; no semantic validation
/// beyond the format and the 24h/60m ranges is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, InvalidTimeOfDay> {
        if hour > 23 || minute > 59 {
            return Err(InvalidTimeOfDay(format!("{hour:02}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// The current local wall-clock time, truncated to the minute.
    pub fn now() -> Self {
        let now = chrono::Local::now().time();
        Self {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(InvalidTimeOfDay(s.to_string()));
        }
        let digit = |b: u8| (b as char).to_digit(10);
        match (digit(bytes[0]), digit(bytes[1]), digit(bytes[3]), digit(bytes[4])) {
            (Some(h1), Some(h2), Some(m1), Some(m2)) => {
                TimeOfDay::new((h1 * 10 + h2) as u8, (m1 * 10 + m2) as u8)
                    .map_err(|_| InvalidTimeOfDay(s.to_string()))
            }
            _ => Err(InvalidTimeOfDay(s.to_string())),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = InvalidTimeOfDay;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> String {
        t.to_string()
    }
}

/// A time-of-day interval during which a line is automatically blocked.
/// When `end <= start` the window wraps midnight: `[start, 24:00) ∪ [00:00, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NightWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl NightWindow {
    pub fn contains(&self, at: TimeOfDay) -> bool {
        if self.end <= self.start {
            at >= self.start || at < self.end
        } else {
            at >= self.start && at < self.end
        }
    }

    /// Whether the window covers the current local time.
    pub fn active_now(&self) -> bool {
        self.contains(TimeOfDay::now())
    }
}

/// Full fault-injection configuration for one line, wire-compatible with
/// the controller's admin API. Saves always round-trip the whole struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    pub name: String,
    pub enabled: bool,
    pub base_latency_ms: u32,
    pub jitter_ms: u32,
    pub error_rate: f64,
    pub timeout_rate: f64,
    pub timeout_ms: u32,
    pub night_block_enabled: bool,
    pub night_block_window: NightWindow,
}

impl LineConfig {
    /// Whether the backend would currently refuse traffic on this line
    /// because of its night-block window.
    pub fn night_blocked_now(&self) -> bool {
        self.night_block_enabled && self.night_block_window.active_now()
    }
}
