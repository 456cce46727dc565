//! Role types understood by the adapter and their backend-role mapping.

pub const ADMIN_ROLE_TYPE: &str = "admin";
pub const DML_ROLE_TYPE: &str = "dml";
pub const READONLY_ROLE_TYPE: &str = "readonly";
pub const ISM_ROLE_TYPE: &str = "ism";

/// Role types advertised to the aggregator during registration.
pub const SUPPORTED_ROLE_TYPES: [&str; 4] = [
    ADMIN_ROLE_TYPE,
    DML_ROLE_TYPE,
    READONLY_ROLE_TYPE,
    ISM_ROLE_TYPE,
];

/// User attribute that carries a tenant's resource prefix.
pub const RESOURCE_PREFIX_ATTRIBUTE: &str = "resource_prefix";

/// Backend roles attached to a user of the given role type.
///
/// Unknown role types are passed through unchanged so that roles created
/// outside the adapter keep working.
pub fn backend_roles(role_type: &str) -> Vec<String> {
    let role_type = role_type.trim();
    if role_type.is_empty() {
        return vec![ADMIN_ROLE_TYPE.to_string()];
    }
    vec![role_type.to_string()]
}
