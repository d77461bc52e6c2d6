//! Scheduling Tool Dispatcher

use std::sync::Arc;

use agent_core::tool::{ToolDispatcher, error_payload};
use async_trait::async_trait;
use serde::Serialize;

use super::args::SchedulingCall;
use crate::error::Result;
use crate::gateway::EhrGateway;

/// Executes scheduling tool calls against an EHR gateway
pub struct SchedulingDispatcher {
    gateway: Arc<dyn EhrGateway>,
}

impl SchedulingDispatcher {
    pub fn new(gateway: Arc<dyn EhrGateway>) -> Self {
        Self { gateway }
    }

    async fn run(&self, call: SchedulingCall) -> Result<String> {
        match call {
            SchedulingCall::GetLocations => to_payload(&self.gateway.list_locations().await?),
            SchedulingCall::GetClinicians { location_id: None } => {
                to_payload(&self.gateway.list_clinicians().await?)
            }
            SchedulingCall::GetClinicians {
                location_id: Some(location_id),
            } => to_payload(
                &self
                    .gateway
                    .list_clinicians_by_location(&location_id)
                    .await?,
            ),
            SchedulingCall::CheckAvailability { clinician_id, date } => {
                to_payload(&self.gateway.get_availability(&clinician_id, &date).await?)
            }
            SchedulingCall::CreatePatient(patient) => {
                to_payload(&self.gateway.create_patient(patient).await?)
            }
            SchedulingCall::CreateAppointment(request) => {
                to_payload(&self.gateway.create_appointment(request).await?)
            }
        }
    }
}

#[async_trait]
impl ToolDispatcher for SchedulingDispatcher {
    async fn execute(&self, name: &str, raw_arguments: &str) -> String {
        let call = match SchedulingCall::parse(name, raw_arguments) {
            Ok(call) => call,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "Rejected tool call");
                return error_payload(e);
            }
        };

        let tool = call.tool_name();
        let side_effects = call.has_side_effects();
        match self.run(call).await {
            Ok(payload) => {
                if side_effects {
                    tracing::info!(tool, gateway = self.gateway.name(), "Tool executed");
                } else {
                    tracing::debug!(tool, gateway = self.gateway.name(), "Tool executed");
                }
                payload
            }
            Err(e) => {
                tracing::warn!(tool, error = %e, "Tool execution failed");
                error_payload(e)
            }
        }
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryEhr;
    use serde_json::Value;

    fn dispatcher() -> SchedulingDispatcher {
        SchedulingDispatcher::new(Arc::new(InMemoryEhr::new()))
    }

    fn parse(payload: &str) -> Value {
        serde_json::from_str(payload).unwrap()
    }

    #[tokio::test]
    async fn test_check_availability_returns_slots() {
        let payload = dispatcher()
            .execute(
                "check_availability",
                r#"{"clinicianId":"doc-1","date":"2025-01-10"}"#,
            )
            .await;
        let json = parse(&payload);

        assert!(json.get("error").is_none());
        assert_eq!(json["clinicianId"], "doc-1");
        assert_eq!(json["slots"].as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_error_payload() {
        let payload = dispatcher().execute("delete_everything", "{}").await;
        let json = parse(&payload);
        let error = json["error"].as_str().unwrap();

        assert!(error.starts_with("Tool execution failed:"));
        assert!(error.contains("delete_everything"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_are_an_error_payload() {
        let dispatcher = dispatcher();
        for raw in ["{oops", r#"{"clinicianId":"doc-1"}"#, "[]"] {
            let json = parse(&dispatcher.execute("check_availability", raw).await);
            assert!(json["error"].is_string(), "no error for {raw}");
        }
    }

    #[tokio::test]
    async fn test_gateway_errors_are_payloads() {
        let payload = dispatcher()
            .execute(
                "check_availability",
                r#"{"clinicianId":"doc-42","date":"2025-01-10"}"#,
            )
            .await;
        assert!(parse(&payload)["error"].as_str().unwrap().contains("doc-42"));
    }

    #[tokio::test]
    async fn test_clinician_filter_and_patient_write() {
        let dispatcher = dispatcher();

        let at_loc3 = parse(
            &dispatcher
                .execute("get_clinicians", r#"{"locationId":"loc-3"}"#)
                .await,
        );
        assert_eq!(at_loc3.as_array().unwrap().len(), 1);
        assert_eq!(at_loc3[0]["id"], "doc-5");

        let created = parse(
            &dispatcher
                .execute(
                    "create_patient",
                    r#"{"firstName":"Ada","lastName":"Lovelace","dateOfBirth":"1815-12-10","phone":"555-0100"}"#,
                )
                .await,
        );
        assert!(
            created["patient"]["id"]
                .as_str()
                .unwrap()
                .starts_with("patient-")
        );
    }
}
