//! Shelter interaction types.
//!
//! Domain types returned to callers plus the wire types matching the remote
//! service's request and response bodies.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// A dog record as returned by the detail endpoint.
///
/// `city` and `state` are absent on the wire; they are attached by location
/// enrichment and set to `"Unknown"` when the lookup fails. Identity fields
/// are never modified after the record is fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub id: String,
    pub img: String,
    pub name: String,
    pub age: u32,
    pub zip_code: String,
    pub breed: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Read-only place reference data, keyed by ZIP code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub zip_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub state: String,
    pub county: String,
}

/// State/city constraint for a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationFilter {
    pub state: Option<String>,
    pub city: Option<String>,
}

impl LocationFilter {
    /// True when neither constraint is set, meaning "no location filter"
    /// rather than "no matching locations".
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.city.is_none()
    }
}

/// Sortable dog fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Breed,
    Name,
    Age,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Breed => "breed",
            SortField::Name => "name",
            SortField::Age => "age",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Ephemeral description of one search request.
///
/// `age_min <= age_max` is not enforced here; the upstream may reject an
/// inverted range.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub breeds: Vec<String>,
    pub age_min: Option<u32>,
    pub age_max: Option<u32>,
    pub state: Option<String>,
    pub city: Option<String>,
    /// 1-based page, clamped to >= 1.
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_field: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl SearchParams {
    pub fn location_filter(&self) -> LocationFilter {
        LocationFilter {
            state: self.state.clone(),
            city: self.city.clone(),
        }
    }
}

/// Output envelope of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub dogs: Vec<Dog>,
    pub total: u64,
    /// Opaque cursor, or a synthesized page number for location searches.
    pub next: Option<String>,
    pub prev: Option<String>,
    pub current_page: u32,
    /// Always equal to `dogs.is_empty()`.
    pub no_results: bool,
}

impl SearchResults {
    pub fn empty(current_page: u32) -> Self {
        Self {
            dogs: Vec::new(),
            total: 0,
            next: None,
            prev: None,
            current_page,
            no_results: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(rename = "resultIds", default)]
    pub result_ids: Vec<String>,
    pub total: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub prev: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LocationSearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub size: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LocationSearchResponse {
    pub results: Vec<Location>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MatchResponse {
    #[serde(rename = "match")]
    pub match_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest {
    pub name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------
