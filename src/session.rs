//! User session state: login, logout, favorites, and match selection.
//!
//! The remote session lives in the gateway's cookie jar; this module tracks
//! the identity and the favorites list the match operation consumes.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, instrument};

use crate::error::{GatewayError, SessionError};
use crate::gateway::Gateway;
use crate::types::{Dog, LoginRequest, MatchResponse};

/// Upper bound on the favorites list.
pub const MAX_FAVORITES: usize = 10;

pub struct UserSession {
    gateway: Arc<Gateway>,
    name: Option<String>,
    email: Option<String>,
    favorites: Vec<Dog>,
    matched: Option<Dog>,
}

impl UserSession {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            name: None,
            email: None,
            favorites: Vec::new(),
            matched: None,
        }
    }

    /// Establish a session. On success the previous favorites and match are
    /// discarded; on failure local state is untouched.
    #[instrument(skip_all)]
    pub async fn login(
        &mut self,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<(), GatewayError> {
        let name = name.into();
        let email = email.into();
        self.gateway
            .post_no_content("/auth/login", &LoginRequest {
                name: name.clone(),
                email: email.clone(),
            })
            .await?;

        debug!(%name, "logged in");
        self.name = Some(name);
        self.email = Some(email);
        self.favorites.clear();
        self.matched = None;
        Ok(())
    }

    /// End the session and clear all local state. Errors propagate and
    /// leave local state untouched.
    #[instrument(skip_all)]
    pub async fn logout(&mut self) -> Result<(), GatewayError> {
        self.gateway
            .post_no_content("/auth/logout", &json!({}))
            .await?;

        self.name = None;
        self.email = None;
        self.favorites.clear();
        self.matched = None;
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.name.is_some()
    }

    pub fn favorites(&self) -> &[Dog] {
        &self.favorites
    }

    pub fn matched(&self) -> Option<&Dog> {
        self.matched.as_ref()
    }

    /// Add a dog to the favorites list. Duplicates are ignored; the list is
    /// capped at [`MAX_FAVORITES`].
    pub fn add_favorite(&mut self, dog: Dog) -> Result<(), SessionError> {
        if self.favorites.len() >= MAX_FAVORITES {
            return Err(SessionError::FavoritesFull);
        }
        if !self.is_favorite(&dog.id) {
            self.favorites.push(dog);
        }
        Ok(())
    }

    pub fn remove_favorite(&mut self, id: &str) {
        self.favorites.retain(|dog| dog.id != id);
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.favorites.iter().any(|dog| dog.id == id)
    }

    /// Ask the service to pick a match from the favorites list.
    ///
    /// The response names one of the submitted IDs; anything else is an
    /// upstream contract violation surfaced as [`SessionError::UnknownMatch`].
    #[instrument(skip_all, fields(favorites = self.favorites.len()))]
    pub async fn generate_match(&mut self) -> Result<Dog, SessionError> {
        if self.favorites.is_empty() {
            return Err(SessionError::NoFavorites);
        }

        let ids: Vec<&str> = self.favorites.iter().map(|dog| dog.id.as_str()).collect();
        let response: MatchResponse = self.gateway.post("/dogs/match", &ids).await?;

        let matched = self
            .favorites
            .iter()
            .find(|dog| dog.id == response.match_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownMatch(response.match_id.clone()))?;

        debug!(id = %matched.id, "match selected");
        self.matched = Some(matched.clone());
        Ok(matched)
    }
}
