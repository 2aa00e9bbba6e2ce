use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Kind of entity an assignment or note is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Host,
    Account,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Host => "host",
            EntityType::Account => "account",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntityType(pub String);

impl fmt::Display for InvalidEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid entity type '{}'", self.0)
    }
}

impl FromStr for EntityType {
    type Err = InvalidEntityType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "host" => Ok(EntityType::Host),
            "account" => Ok(EntityType::Account),
            other => Err(InvalidEntityType(other.to_string())),
        }
    }
}

/// Filters accepted by the assignment listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentQuery {
    pub resolved: Option<bool>,
    pub created_after: Option<NaiveDateTime>,
    pub assignees: Option<i64>,
    pub hosts: Option<String>,
    pub accounts: Option<String>,
}

impl AssignmentQuery {
    /// Scopes the query to a set of entities, e.g. `hosts=10,20`.
    pub fn for_entities(entity_type: EntityType, entity_ids: &[i64]) -> Self {
        let joined = entity_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        match entity_type {
            EntityType::Host => Self {
                hosts: Some(joined),
                ..Default::default()
            },
            EntityType::Account => Self {
                accounts: Some(joined),
                ..Default::default()
            },
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(resolved) = self.resolved {
            pairs.push(("resolved", resolved.to_string()));
        }
        if let Some(created_after) = self.created_after {
            pairs.push((
                "created_after",
                created_after.format(TIMESTAMP_FORMAT).to_string(),
            ));
        }
        if let Some(assignee) = self.assignees {
            pairs.push(("assignees", assignee.to_string()));
        }
        if let Some(hosts) = &self.hosts {
            pairs.push(("hosts", hosts.clone()));
        }
        if let Some(accounts) = &self.accounts {
            pairs.push(("accounts", accounts.clone()));
        }
        pairs
    }
}

/// Wire format used for timestamps in both tool input and query strings.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Body of `POST assignments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentRequest {
    pub assign_to_user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_host_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assign_account_id: Option<i64>,
}

impl AssignmentRequest {
    pub fn new(assign_to_user_id: i64, entity_id: i64, entity_type: EntityType) -> Self {
        let (assign_host_id, assign_account_id) = match entity_type {
            EntityType::Host => (Some(entity_id), None),
            EntityType::Account => (None, Some(entity_id)),
        };
        Self {
            assign_to_user_id,
            assign_host_id,
            assign_account_id,
        }
    }
}
