//! HTTP implementation of the backend client

use super::DisruptionBackend;
use aero_common::{
    endpoints, AeroError, Ack, BackendConfig, DataSnapshot, HealRequest, HealResponse,
    OrchestratorMode, OvertimeQuote, OvertimeQuoteRequest, ResolutionOption, ResolveRequest,
    RestGrantRequest, SimulationRequest, StatusReport,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// JSON-over-HTTP client for the disruption service
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, AeroError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AeroError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, u32)],
    ) -> Result<T, AeroError> {
        debug!(endpoint = path, "GET");
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(path, response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AeroError> {
        debug!(endpoint = path, "POST");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;
        Self::decode(path, response).await
    }

    fn unreachable(&self, err: reqwest::Error) -> AeroError {
        AeroError::Unreachable {
            url: self.base_url.clone(),
            message: err.to_string(),
        }
    }

    async fn decode<T: DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, AeroError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| AeroError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(AeroError::Backend {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        // Empty bodies decode as an empty object so all-optional acks still parse
        let text = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(text).map_err(|e| AeroError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl DisruptionBackend for HttpBackend {
    async fn fetch_data(&self, page: u32, limit: u32) -> Result<DataSnapshot, AeroError> {
        self.get(endpoints::DATA, &[("page", page), ("limit", limit)])
            .await
    }

    async fn fetch_status(&self) -> Result<StatusReport, AeroError> {
        self.get(endpoints::STATUS, &[]).await
    }

    async fn heal(&self, mode: OrchestratorMode) -> Result<HealResponse, AeroError> {
        self.post(endpoints::HEAL, &HealRequest { mode }).await
    }

    async fn resolve(&self, option: &ResolutionOption) -> Result<Ack, AeroError> {
        let request = ResolveRequest {
            option: option.clone(),
        };
        self.post(endpoints::RESOLVE, &request).await
    }

    async fn simulate(&self, request: &SimulationRequest) -> Result<Ack, AeroError> {
        self.post(endpoints::SIMULATE, request).await
    }

    async fn seed(&self) -> Result<Ack, AeroError> {
        self.get(endpoints::SEED, &[]).await
    }

    async fn grant_rest(&self, pilot_id: &str) -> Result<Ack, AeroError> {
        let request = RestGrantRequest {
            pilot_id: pilot_id.to_string(),
        };
        self.post(endpoints::CREW_REST, &request).await
    }

    async fn quote_overtime(
        &self,
        request: &OvertimeQuoteRequest,
    ) -> Result<OvertimeQuote, AeroError> {
        self.post(endpoints::CREW_COST, request).await
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
