//! Simulation & Reset Gateway
//!
//! Fire-and-forget calls that do not touch the resolution flow. Only one
//! call may be in flight at a time.

use crate::backend::{check_ack, DisruptionBackend};
use aero_common::{
    endpoints, AeroError, Ack, OvertimeQuote, OvertimeQuoteRequest, SimulationRequest,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Clears the in-flight flag when dropped
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SimulationGateway {
    backend: Arc<dyn DisruptionBackend>,
    busy: AtomicBool,
}

impl SimulationGateway {
    pub fn new(backend: Arc<dyn DisruptionBackend>) -> Self {
        Self {
            backend,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn begin(&self, what: &'static str) -> Result<InFlight<'_>, AeroError> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| InFlight(&self.busy))
            .map_err(|_| AeroError::Busy(what))
    }

    pub async fn simulate(&self, request: &SimulationRequest) -> Result<Ack, AeroError> {
        let _guard = self.begin("simulate")?;
        let result = self
            .backend
            .simulate(request)
            .await
            .and_then(|ack| check_ack(endpoints::SIMULATE, ack));
        match &result {
            Ok(ack) => info!(kind = %request.kind, ack = %ack.summary(), "disruption injected"),
            Err(e) => warn!(kind = %request.kind, error = %e, "simulation failed"),
        }
        result
    }

    pub async fn seed(&self) -> Result<Ack, AeroError> {
        let _guard = self.begin("seed")?;
        let result = self
            .backend
            .seed()
            .await
            .and_then(|ack| check_ack(endpoints::SEED, ack));
        match &result {
            Ok(ack) => info!(ack = %ack.summary(), "dataset reseeded"),
            Err(e) => warn!(error = %e, "reseed failed"),
        }
        result
    }

    /// The only event that legitimately lowers a pilot's fatigue
    pub async fn grant_rest(&self, pilot_id: &str) -> Result<Ack, AeroError> {
        let _guard = self.begin("rest grant")?;
        let result = self
            .backend
            .grant_rest(pilot_id)
            .await
            .and_then(|ack| check_ack(endpoints::CREW_REST, ack));
        if let Err(e) = &result {
            warn!(pilot_id, error = %e, "rest grant failed");
        }
        result
    }

    pub async fn quote_overtime(
        &self,
        pilot_id: &str,
        additional_minutes: u32,
    ) -> Result<OvertimeQuote, AeroError> {
        let _guard = self.begin("overtime quote")?;
        let request = OvertimeQuoteRequest {
            pilot_id: pilot_id.to_string(),
            additional_minutes,
        };
        self.backend.quote_overtime(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, FakeBackend, FakeFailure};
    use aero_common::DisruptionKind;
    use std::time::Duration;

    #[tokio::test]
    async fn test_simulate_passes_request_through() {
        let fake = Arc::new(FakeBackend::new());
        let gateway = SimulationGateway::new(fake.clone());

        let mut request = SimulationRequest::new(DisruptionKind::Technical);
        request.flight_id = Some("FLY1001".into());
        gateway.simulate(&request).await.unwrap();

        assert_eq!(fake.calls(), vec![BackendCall::Simulate(request)]);
        assert!(!gateway.is_busy());
    }

    #[tokio::test]
    async fn test_error_ack_is_failure() {
        let fake = Arc::new(FakeBackend::new());
        fake.push_simulate(Ok(Ack {
            status: Some("ERROR".into()),
            message: Some("No assigned flights found.".into()),
        }));
        let gateway = SimulationGateway::new(fake);

        let request = SimulationRequest::new(DisruptionKind::Crew);
        assert!(gateway.simulate(&request).await.is_err());
        assert!(!gateway.is_busy());
    }

    #[tokio::test]
    async fn test_busy_while_in_flight() {
        tokio::time::pause();
        let fake = Arc::new(FakeBackend::new().with_latency(Duration::from_secs(1)));
        let gateway = Arc::new(SimulationGateway::new(fake));

        let first = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move { gateway.seed().await })
        };
        tokio::task::yield_now().await;
        assert!(gateway.is_busy());
        assert!(matches!(gateway.seed().await, Err(AeroError::Busy(_))));

        assert!(first.await.unwrap().is_ok());
        assert!(!gateway.is_busy());
    }

    #[tokio::test]
    async fn test_flag_cleared_after_failure() {
        let fake = Arc::new(FakeBackend::new());
        fake.push_rest(Err(FakeFailure::Unreachable));
        let gateway = SimulationGateway::new(fake);

        assert!(gateway.grant_rest("P-204").await.is_err());
        assert!(!gateway.is_busy());
        assert!(gateway.grant_rest("P-204").await.is_ok());
    }
}
