pub mod client;
pub mod roles;

pub use client::{OpenSearchSecurityClient, SecurityApiClient};
