//! Backend client abstraction
//!
//! Production code talks to the disruption service through `HttpBackend`.
//! Tests use `FakeBackend` with scripted replies and a call journal.

pub mod fake;
pub mod http;

pub use fake::{BackendCall, FakeBackend, FakeFailure};
pub use http::HttpBackend;

use aero_common::{
    AeroError, Ack, DataSnapshot, HealResponse, OrchestratorMode, OvertimeQuote,
    OvertimeQuoteRequest, ResolutionOption, SimulationRequest, StatusReport,
};
use async_trait::async_trait;

// ============================================================================
// Backend Trait
// ============================================================================

/// One async method per backend endpoint
#[async_trait]
pub trait DisruptionBackend: Send + Sync {
    /// `GET /data?page=&limit=`
    async fn fetch_data(&self, page: u32, limit: u32) -> Result<DataSnapshot, AeroError>;

    /// `GET /status`
    async fn fetch_status(&self) -> Result<StatusReport, AeroError>;

    /// `POST /heal`
    async fn heal(&self, mode: OrchestratorMode) -> Result<HealResponse, AeroError>;

    /// `POST /resolve`
    async fn resolve(&self, option: &ResolutionOption) -> Result<Ack, AeroError>;

    /// `POST /simulate`
    async fn simulate(&self, request: &SimulationRequest) -> Result<Ack, AeroError>;

    /// `GET /seed`
    async fn seed(&self) -> Result<Ack, AeroError>;

    /// `POST /crew/update_rest`
    async fn grant_rest(&self, pilot_id: &str) -> Result<Ack, AeroError>;

    /// `POST /crew/calculate_cost`
    async fn quote_overtime(
        &self,
        request: &OvertimeQuoteRequest,
    ) -> Result<OvertimeQuote, AeroError>;

    /// Where this backend lives, for messages
    fn describe(&self) -> String;
}

/// Reject acknowledgements that report `ERROR` with a 200 status
pub fn check_ack(endpoint: &str, ack: Ack) -> Result<Ack, AeroError> {
    if ack.is_error() {
        Err(AeroError::Backend {
            endpoint: endpoint.to_string(),
            status: 200,
            body: ack.summary(),
        })
    } else {
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_ack_error_status() {
        let ack = Ack {
            status: Some("ERROR".into()),
            message: Some("No assigned flights found.".into()),
        };
        let err = check_ack("/simulate", ack).unwrap_err();
        assert!(matches!(err, AeroError::Backend { status: 200, .. }));
    }

    #[test]
    fn test_check_ack_passes_normal_status() {
        let ack = Ack {
            status: Some("RESOLVED".into()),
            message: None,
        };
        assert!(check_ack("/resolve", ack).is_ok());
    }
}
