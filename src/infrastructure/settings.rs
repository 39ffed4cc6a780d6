use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ConsoleSettings {
    pub funnel: FunnelSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FunnelSettings {
    /// Base URL of the traffic controller, e.g. `http://127.0.0.1:8080`.
    pub endpoint: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    5000
}

impl FunnelSettings {
    pub fn poll_cadence(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

pub fn load_console_settings() -> anyhow::Result<ConsoleSettings> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/console"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
