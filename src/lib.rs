//! Typed HTTP client for a dog-adoption search service.
//!
//! This crate provides:
//! - HTTP client construction with cookie-based session credentials
//! - Breed/age/location dog search with client-side re-pagination when a
//!   location filter forces multi-batch fetching
//! - A per-state location cache and batched ZIP-to-place enrichment
//! - Session state: login/logout, a favorites list, and match selection
//!
//! ## Usage
//!
//! ```ignore
//! use shelter_client::{SearchParams, ShelterClient, ShelterClientConfig};
//!
//! let mut client = ShelterClient::new(ShelterClientConfig::new(
//!     "https://frontend-take-home-service.fetch.com",
//! ))?;
//!
//! client.session_mut().login("Ada", "ada@example.com").await?;
//! let results = client
//!     .dogs()
//!     .search(&SearchParams {
//!         breeds: vec!["Beagle".to_string()],
//!         state: Some("NY".to_string()),
//!         ..Default::default()
//!     })
//!     .await;
//! ```

mod client;
mod config;
mod error;
mod gateway;
mod locations;
mod search;
mod session;
mod types;

pub use client::ShelterClient;
pub use config::ShelterClientConfig;
pub use error::{GatewayError, SessionError};
pub use gateway::Gateway;
pub use locations::{LocationResolver, StateLocations, UNKNOWN_PLACE};
pub use search::{SearchEngine, DEFAULT_PAGE_SIZE};
pub use session::{UserSession, MAX_FAVORITES};
pub use types::{
    Dog,
    Location,
    LocationFilter,
    SearchParams,
    SearchResults,
    SortField,
    SortOrder,
};
