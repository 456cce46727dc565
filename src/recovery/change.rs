//! JSON-Patch changes sent to the internal users resource.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::ConnectionProperties;
use crate::security::roles::{backend_roles, ADMIN_ROLE_TYPE, RESOURCE_PREFIX_ATTRIBUTE};

pub const ADD_OPERATION: &str = "add";

/// Cluster-facing representation of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub attributes: BTreeMap<String, String>,
    pub backend_roles: Vec<String>,
    pub password: String,
}

impl Content {
    /// Derive the user content; role defaults to admin, prefix to the db name.
    pub fn from_properties(properties: &ConnectionProperties) -> Self {
        let role_type = properties.role().unwrap_or(ADMIN_ROLE_TYPE);
        let mut attributes = BTreeMap::new();
        attributes.insert(
            RESOURCE_PREFIX_ATTRIBUTE.to_string(),
            properties.resource_prefix_or_db_name().to_string(),
        );

        Self {
            attributes,
            backend_roles: backend_roles(role_type),
            password: properties.password.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "op")]
    pub operation: String,
    pub path: String,
    pub value: Content,
}

impl Change {
    pub fn add_user(properties: &ConnectionProperties) -> Self {
        Self {
            operation: ADD_OPERATION.to_string(),
            path: format!("/{}", properties.username),
            value: Content::from_properties(properties),
        }
    }
}

/// One change per connection property, in input order.
pub fn build_changes(properties: &[ConnectionProperties]) -> Vec<Change> {
    properties.iter().map(Change::add_user).collect()
}

/// Split changes into consecutive batches of at most `batch_size`.
pub fn batches(changes: &[Change], batch_size: usize) -> std::slice::Chunks<'_, Change> {
    changes.chunks(batch_size.max(1))
}
