//! Investigation tools: assignments, entity notes and detection remediation.
//!
//! Each operation validates its arguments, issues exactly one call through
//! [`InvestigationApi`] and renders the outcome as text for the agent.
//! Validation and platform failures are both reported as a [`ToolError`]
//! naming the operation.

use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::validators::{parse_entity_type, require_positive, validate_date_range};
use super::{Failure, ToolError};
use crate::vectra::client::InvestigationApi;
use crate::vectra::models::{AssignmentQuery, AssignmentRequest};

pub const NO_ASSIGNMENTS_FOUND: &str = "No assignments found.";
pub const NO_DETECTION_IDS: &str = "No detection IDs provided.";

#[derive(Clone)]
pub struct InvestigationTools {
    client: Arc<dyn InvestigationApi>,
}

impl InvestigationTools {
    pub fn new(client: Arc<dyn InvestigationApi>) -> Self {
        Self { client }
    }

    pub async fn list_assignments(
        &self,
        resolved: bool,
        created_after: Option<&str>,
    ) -> Result<String, ToolError> {
        info!(resolved, ?created_after, "Listing assignments");

        async {
            let range = validate_date_range(created_after, None)?;
            let query = AssignmentQuery {
                resolved: Some(resolved),
                created_after: range.after,
                ..Default::default()
            };
            let assignments = self.client.get_assignments(&query).await?;
            render_listing(assignments)
        }
        .await
        .map_err(|e| ToolError::new("Failed to list assignments", e))
    }

    pub async fn list_assignments_for_user(
        &self,
        user_id: i64,
        resolved: bool,
    ) -> Result<String, ToolError> {
        info!(user_id, resolved, "Listing assignments for user");

        async {
            let query = AssignmentQuery {
                resolved: Some(resolved),
                assignees: Some(user_id),
                ..Default::default()
            };
            let assignments = self.client.get_assignments(&query).await?;
            render_listing(assignments)
        }
        .await
        .map_err(|e| {
            ToolError::new(format!("Failed to list assignments for user {}", user_id), e)
        })
    }

    pub async fn get_assignment_detail_by_id(
        &self,
        assignment_id: i64,
    ) -> Result<String, ToolError> {
        info!(assignment_id, "Retrieving assignment detail");

        async {
            require_positive("assignment_id", assignment_id)?;
            let assignment = self.client.get_assignment(assignment_id).await?;
            Ok::<_, Failure>(serde_json::to_string_pretty(&assignment)?)
        }
        .await
        .map_err(|e| ToolError::new(format!("Failed to retrieve assignment {}", assignment_id), e))
    }

    pub async fn get_assignment_for_entity(
        &self,
        entity_ids: &[i64],
        entity_type: &str,
    ) -> Result<String, ToolError> {
        info!(?entity_ids, entity_type, "Retrieving assignments for entities");

        async {
            let entity_type = parse_entity_type(entity_type)?;
            let query = AssignmentQuery::for_entities(entity_type, entity_ids);
            let response = self.client.get_assignments(&query).await?;

            let results = match response {
                Some(Value::Object(mut page)) => page.remove("results").unwrap_or(Value::Null),
                Some(other) => other,
                None => Value::Null,
            };
            if is_empty(&results) {
                return Ok(format!(
                    "No assignments found for {}: {:?}.",
                    entity_type, entity_ids
                ));
            }
            Ok::<_, Failure>(serde_json::to_string_pretty(&results)?)
        }
        .await
        .map_err(|e| {
            ToolError::new(
                format!(
                    "Failed to fetch assignment for {}: {:?}",
                    entity_type, entity_ids
                ),
                e,
            )
        })
    }

    pub async fn create_assignment(
        &self,
        assign_to_user_id: i64,
        assign_entity_id: i64,
        assign_entity_type: &str,
    ) -> Result<String, ToolError> {
        info!(
            assign_to_user_id,
            assign_entity_id, assign_entity_type, "Creating assignment"
        );

        async {
            require_positive("assign_to_user_id", assign_to_user_id)?;
            let entity_type = parse_entity_type(assign_entity_type)?;
            let request = AssignmentRequest::new(assign_to_user_id, assign_entity_id, entity_type);
            let assignment = self.client.create_assignment(&request).await?;
            Ok::<_, Failure>(serde_json::to_string(&assignment)?)
        }
        .await
        .map_err(|e| ToolError::new("Failed to create assignment", e))
    }

    pub async fn create_entity_note(
        &self,
        entity_id: i64,
        entity_type: &str,
        note: &str,
    ) -> Result<String, ToolError> {
        info!(entity_id, entity_type, "Adding note to entity");

        async {
            require_positive("entity_id", entity_id)?;
            let entity_type = parse_entity_type(entity_type)?;
            let created = self
                .client
                .add_entity_note(entity_id, entity_type, note)
                .await?;
            Ok::<_, Failure>(serde_json::to_string_pretty(&created)?)
        }
        .await
        .map_err(|e| ToolError::new(format!("Failed to add note to entity {}", entity_id), e))
    }

    pub async fn mark_detection_fixed(
        &self,
        detection_ids: &[i64],
        mark_fixed: bool,
    ) -> Result<String, ToolError> {
        if detection_ids.is_empty() {
            return Ok(NO_DETECTION_IDS.to_string());
        }
        info!(?detection_ids, mark_fixed, "Marking detections");

        self.client
            .mark_detection_fixed(detection_ids, mark_fixed)
            .await
            .map_err(|e| ToolError::new("Failed to mark detections", e))?;

        Ok(format!(
            "Marked {} detections as {}.",
            detection_ids.len(),
            if mark_fixed { "fixed" } else { "not fixed" }
        ))
    }

    pub async fn delete_assignment(&self, assignment_id: i64) -> Result<String, ToolError> {
        info!(assignment_id, "Deleting assignment");

        async {
            require_positive("assignment_id", assignment_id)?;
            self.client.delete_assignment(assignment_id).await?;
            Ok::<_, Failure>(format!("Assignment {} deleted successfully.", assignment_id))
        }
        .await
        .map_err(|e| ToolError::new(format!("Failed to delete assignment {}", assignment_id), e))
    }
}

fn render_listing(assignments: Option<Value>) -> Result<String, Failure> {
    match assignments {
        Some(value) if !is_empty(&value) && !has_empty_results(&value) => {
            Ok(serde_json::to_string_pretty(&value)?)
        }
        _ => Ok(NO_ASSIGNMENTS_FOUND.to_string()),
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Paginated listings carry their rows under `results`.
fn has_empty_results(value: &Value) -> bool {
    matches!(value.get("results"), Some(Value::Array(rows)) if rows.is_empty())
}
