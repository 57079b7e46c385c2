use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use cache_coordinator::{Coordinator, CoordinatorError, RefreshPurpose};
use mailnav_core_types::{PracticeId, PracticeRecord};

use crate::schema::Request;

/// Bridges the JSON message protocol onto the coordinator. Every request
/// gets exactly one response; failures come back as `{"error": ...}`
/// payloads, never as a missing reply.
pub struct MessageRouter {
    coordinator: Arc<Coordinator>,
}

impl MessageRouter {
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self { coordinator }
    }

    pub async fn handle(&self, raw: Value) -> Value {
        let request: Request = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "unparseable request");
                return json!({ "error": format!("unrecognized request: {err}") });
            }
        };
        debug!(?request, "handling request");
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(err) => json!({ "error": err.user_message() }),
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Value, CoordinatorError> {
        match request {
            Request::GetPracticeCache => {
                let cache = self.coordinator.practice_cache_snapshot().await;
                Ok(json!({ "practiceCache": cache }))
            }
            Request::OpenPractice {
                input,
                setting_type,
            } => {
                self.coordinator.open_practice(&input, setting_type).await?;
                Ok(json!({ "success": true }))
            }
            Request::RequestActiveScrape => {
                let count = self.coordinator.refresh(RefreshPurpose::Manual).await?;
                Ok(json!({ "success": true, "practicesCount": count }))
            }
            Request::GetPracticeStatus { identifier } => {
                let identifier = PracticeId::parse(&identifier).ok_or_else(|| {
                    CoordinatorError::not_found(identifier.clone(), Vec::new())
                })?;
                let record = self.coordinator.status(&identifier).await?;
                Ok(json!({ "success": true, "status": status_payload(&record) }))
            }
            Request::SearchBySecondaryCode { code } => {
                match self.coordinator.search_by_secondary_code(&code).await {
                    Ok(record) => Ok(json!({ "success": true, "record": record })),
                    Err(err @ CoordinatorError::NotFound { .. }) => {
                        Ok(json!({ "success": false, "error": err.user_message() }))
                    }
                    Err(err) => Err(err),
                }
            }
        }
    }
}

fn status_payload(record: &PracticeRecord) -> Value {
    json!({
        "identifier": record.identifier,
        "displayName": record.display_name,
        "category": record.attributes.category.as_deref().unwrap_or("N/A"),
        "quota": record.attributes.quota.as_deref().unwrap_or("N/A"),
        "processed": record.attributes.processed.as_deref().unwrap_or("N/A"),
        "tier": record.attributes.tier.as_deref().unwrap_or("N/A"),
        "secondaryCode": record.secondary_code,
    })
}
