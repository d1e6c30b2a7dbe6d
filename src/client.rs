//! Top-level client wiring the gateway, resolver, search engine and session.

use std::fmt::Debug;
use std::sync::Arc;

use crate::config::ShelterClientConfig;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::locations::LocationResolver;
use crate::search::SearchEngine;
use crate::session::UserSession;

/// A client for the dog-adoption service.
///
/// Owns one [`Gateway`] (and therefore one session cookie jar) shared by the
/// location resolver, the search engine, and the user session.
pub struct ShelterClient {
    gateway: Arc<Gateway>,
    locations: Arc<LocationResolver>,
    dogs: SearchEngine,
    session: UserSession,
}

impl Debug for ShelterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShelterClient")
            .field("base_url", &self.gateway.base_url())
            .finish_non_exhaustive()
    }
}

impl ShelterClient {
    pub fn new(config: ShelterClientConfig) -> Result<Self, GatewayError> {
        let gateway = Arc::new(Gateway::new(&config)?);
        let locations = Arc::new(LocationResolver::new(Arc::clone(&gateway)));
        let dogs = SearchEngine::new(Arc::clone(&gateway), Arc::clone(&locations));
        let session = UserSession::new(Arc::clone(&gateway));
        Ok(Self {
            gateway,
            locations,
            dogs,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }

    pub fn dogs(&self) -> &SearchEngine {
        &self.dogs
    }

    pub fn locations(&self) -> &LocationResolver {
        &self.locations
    }

    pub fn session(&self) -> &UserSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut UserSession {
        &mut self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_rejects_invalid_base_url() {
        let result = ShelterClient::new(ShelterClientConfig::new("not a url"));
        assert!(matches!(result, Err(GatewayError::InvalidUrl(_))));
    }

    #[test]
    fn debug_shows_only_the_base_url() {
        let client =
            ShelterClient::new(ShelterClientConfig::new("https://shelter.example")).unwrap();
        let rendered = format!("{client:?}");
        assert!(rendered.contains("https://shelter.example"));
        assert!(!rendered.contains("session"));
    }
}
