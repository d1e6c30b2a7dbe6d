//! Configuration types for shelter client construction.

use std::collections::BTreeMap;

/// Configuration for shelter client construction.
#[derive(Debug, Clone)]
pub struct ShelterClientConfig {
    /// Base URL for the adoption service API.
    pub base_url: String,
    /// Additional headers to include in requests.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional user agent override.
    pub user_agent: Option<String>,
}

impl ShelterClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
        }
    }
}
