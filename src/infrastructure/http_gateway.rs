// HTTP gateway to the traffic controller's admin and metrics API
use crate::application::gateway::{FunnelError, FunnelGateway};
use crate::domain::line::{LineConfig, LineId};
use crate::domain::metrics::MetricsSnapshot;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpFunnelGateway {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ConfigDocument {
    lines: HashMap<LineId, LineConfig>,
}

impl HttpFunnelGateway {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FunnelError> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(FunnelError::Fetch)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FunnelError::HttpStatus(status));
        }

        response.json::<T>().await.map_err(FunnelError::Decode)
    }

    fn check_status(response: &reqwest::Response) -> Result<(), FunnelError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(FunnelError::HttpStatus(status))
        }
    }
}

#[async_trait]
impl FunnelGateway for HttpFunnelGateway {
    async fn fetch_config(&self) -> Result<HashMap<LineId, LineConfig>, FunnelError> {
        let document: ConfigDocument = self.get_json("/admin/config").await?;
        Ok(document.lines)
    }

    async fn fetch_line(&self, id: LineId) -> Result<LineConfig, FunnelError> {
        self.get_json(&format!("/admin/line/{id}")).await
    }

    async fn save_line(&self, id: LineId, config: &LineConfig) -> Result<(), FunnelError> {
        tracing::debug!(line = %id, "saving line configuration");
        let response = self
            .client
            .post(self.url(&format!("/admin/line/{id}")))
            .json(config)
            .send()
            .await
            .map_err(FunnelError::Fetch)?;
        // response body, if any, is not consumed
        Self::check_status(&response)
    }

    async fn fetch_snapshot(&self) -> Result<MetricsSnapshot, FunnelError> {
        self.get_json("/metrics/snapshot").await
    }

    async fn reset_metrics(&self) -> Result<(), FunnelError> {
        let response = self
            .client
            .post(self.url("/admin/reset"))
            .send()
            .await
            .map_err(FunnelError::Fetch)?;
        Self::check_status(&response)
    }
}
