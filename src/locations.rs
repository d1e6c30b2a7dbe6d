//! Location resolution and enrichment.
//!
//! Translates state/city filters into ZIP code sets (with a per-state
//! cache) and enriches dog records with place names by batched reverse ZIP
//! lookup. Both operations fail soft: upstream errors degrade to an empty
//! set or `"Unknown"` placeholders instead of failing the search.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;
use tracing::{debug, instrument, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::types::{Dog, Location, LocationFilter, LocationSearchRequest, LocationSearchResponse};

/// Upstream request-size constraint on ZIP lists.
pub(crate) const ZIP_BATCH_SIZE: usize = 100;

/// One large page instead of paginating; state-level ZIP counts are bounded
/// in practice.
const LOCATION_SEARCH_SIZE: u32 = 10_000;

/// Placeholder for `city`/`state` when a ZIP has no known place.
pub const UNKNOWN_PLACE: &str = "Unknown";

/// Cached lookup result for one state.
#[derive(Debug, Clone, Default)]
pub struct StateLocations {
    /// Distinct city names, sorted ascending.
    pub cities: Vec<String>,
    /// Distinct ZIP codes in order of first appearance.
    pub zip_codes: IndexSet<String>,
}

/// Resolves location filters to ZIP sets and reverse-looks-up places.
///
/// The cache holds state-only query results for the resolver's lifetime;
/// there is no TTL or eviction.
pub struct LocationResolver {
    gateway: Arc<Gateway>,
    cache: Mutex<HashMap<String, StateLocations>>,
}

impl LocationResolver {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self {
            gateway,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// ZIP codes matching a state/city filter.
    ///
    /// An empty filter resolves to an empty set without a network call,
    /// meaning "no location constraint". Upstream failures also collapse to
    /// an empty set after a warning; callers cannot distinguish a failed
    /// lookup from a filter that matches no locations.
    #[instrument(skip_all, fields(state = ?filter.state, city = ?filter.city))]
    pub async fn resolve_zip_codes(&self, filter: &LocationFilter) -> IndexSet<String> {
        if filter.is_empty() {
            return IndexSet::new();
        }

        let state_only = filter.state.as_ref().filter(|_| filter.city.is_none());
        if let Some(state) = state_only {
            if let Some(entry) = self.cache().get(state) {
                debug!(%state, zips = entry.zip_codes.len(), "location cache hit");
                return entry.zip_codes.clone();
            }
        }

        match self.search_locations(filter).await {
            Ok(entry) => {
                let zip_codes = entry.zip_codes.clone();
                if let Some(state) = state_only {
                    self.cache().insert(state.clone(), entry);
                }
                zip_codes
            },
            Err(err) => {
                warn!(%err, "location search failed, treating as no matching locations");
                IndexSet::new()
            },
        }
    }

    /// City names cached for a state, or empty if the state has not been
    /// resolved yet.
    pub fn cities_for_state(&self, state: &str) -> Vec<String> {
        self.cache()
            .get(state)
            .map(|entry| entry.cities.clone())
            .unwrap_or_default()
    }

    /// Attach `city`/`state` to each dog by reverse ZIP lookup.
    ///
    /// Output preserves input order and count. If any lookup batch fails the
    /// whole enrichment degrades: every dog comes back with both fields set
    /// to [`UNKNOWN_PLACE`].
    pub async fn enrich_dogs_with_locations(&self, dogs: Vec<Dog>) -> Vec<Dog> {
        let zip_codes: IndexSet<&str> = dogs.iter().map(|dog| dog.zip_code.as_str()).collect();

        let lookup = match self.lookup_locations(&zip_codes).await {
            Ok(lookup) => lookup,
            Err(err) => {
                warn!(%err, dogs = dogs.len(), "enrichment failed, marking all places unknown");
                HashMap::new()
            },
        };

        dogs.into_iter()
            .map(|mut dog| {
                match lookup.get(dog.zip_code.as_str()) {
                    Some(location) => {
                        dog.city = Some(location.city.clone());
                        dog.state = Some(location.state.clone());
                    },
                    None => {
                        dog.city = Some(UNKNOWN_PLACE.to_string());
                        dog.state = Some(UNKNOWN_PLACE.to_string());
                    },
                }
                dog
            })
            .collect()
    }

    async fn search_locations(
        &self,
        filter: &LocationFilter,
    ) -> Result<StateLocations, GatewayError> {
        let body = LocationSearchRequest {
            states: filter.state.clone().map(|state| vec![state]),
            city: filter.city.clone(),
            size: LOCATION_SEARCH_SIZE,
        };
        let response: LocationSearchResponse =
            self.gateway.post("/locations/search", &body).await?;

        let mut zip_codes = IndexSet::new();
        let mut cities = BTreeSet::new();
        for location in response.results {
            if !location.city.is_empty() {
                cities.insert(location.city);
            }
            zip_codes.insert(location.zip_code);
        }
        debug!(zips = zip_codes.len(), cities = cities.len(), "resolved locations");

        Ok(StateLocations {
            cities: cities.into_iter().collect(),
            zip_codes,
        })
    }

    /// ZIP-to-place map built from one batch request per 100 ZIPs. Unknown
    /// ZIPs come back as nulls and are dropped here.
    async fn lookup_locations(
        &self,
        zip_codes: &IndexSet<&str>,
    ) -> Result<HashMap<String, Location>, GatewayError> {
        let zips: Vec<&str> = zip_codes.iter().copied().collect();
        let mut lookup = HashMap::with_capacity(zips.len());
        for batch in zips.chunks(ZIP_BATCH_SIZE) {
            let locations: Vec<Option<Location>> = self.gateway.post("/locations", batch).await?;
            for location in locations.into_iter().flatten() {
                lookup.insert(location.zip_code.clone(), location);
            }
        }
        Ok(lookup)
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, StateLocations>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::config::ShelterClientConfig;
    use crate::types::fixtures::{dog, location};

    fn resolver(url: &str) -> LocationResolver {
        let gateway = Arc::new(Gateway::new(&ShelterClientConfig::new(url)).unwrap());
        LocationResolver::new(gateway)
    }

    fn state_filter(state: &str) -> LocationFilter {
        LocationFilter {
            state: Some(state.to_string()),
            city: None,
        }
    }

    #[tokio::test]
    async fn empty_filter_resolves_without_network_call() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/locations/search");
            then.status(200).json_body(json!({"results": [], "total": 0}));
        });

        let zips = resolver(&server.base_url())
            .resolve_zip_codes(&LocationFilter::default())
            .await;
        assert!(zips.is_empty());
        mock.assert_hits(0);
    }

    #[tokio::test]
    async fn state_only_queries_hit_the_cache_on_repeat() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/locations/search")
                .json_body_partial(r#"{"states": ["NY"], "size": 10000}"#);
            then.status(200).json_body(json!({
                "results": [
                    location("12345", "Albany", "NY"),
                    location("12346", "Albany", "NY"),
                    location("12345", "Albany", "NY"),
                ],
                "total": 3
            }));
        });

        let resolver = resolver(&server.base_url());
        let first = resolver.resolve_zip_codes(&state_filter("NY")).await;
        let second = resolver.resolve_zip_codes(&state_filter("NY")).await;

        assert_eq!(first, second);
        assert_eq!(
            first.into_iter().collect::<Vec<_>>(),
            vec!["12345".to_string(), "12346".to_string()]
        );
        // second resolution is a cache hit
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn city_queries_are_not_cached() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/locations/search");
            then.status(200).json_body(json!({
                "results": [location("10001", "New York", "NY")],
                "total": 1
            }));
        });

        let resolver = resolver(&server.base_url());
        let filter = LocationFilter {
            state: Some("NY".to_string()),
            city: Some("New York".to_string()),
        };
        resolver.resolve_zip_codes(&filter).await;
        resolver.resolve_zip_codes(&filter).await;
        mock.assert_hits(2);
    }

    #[tokio::test]
    async fn failed_location_search_resolves_to_empty_set() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/locations/search");
            then.status(500);
        });

        let zips = resolver(&server.base_url())
            .resolve_zip_codes(&state_filter("NY"))
            .await;
        assert!(zips.is_empty());
    }

    #[tokio::test]
    async fn cities_for_state_populated_by_state_resolution() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/locations/search");
            then.status(200).json_body(json!({
                "results": [
                    location("12345", "Troy", "NY"),
                    location("12346", "Albany", "NY"),
                ],
                "total": 2
            }));
        });

        let resolver = resolver(&server.base_url());
        assert!(resolver.cities_for_state("NY").is_empty());
        resolver.resolve_zip_codes(&state_filter("NY")).await;
        assert_eq!(resolver.cities_for_state("NY"), vec![
            "Albany".to_string(),
            "Troy".to_string()
        ]);
    }

    #[tokio::test]
    async fn enrichment_preserves_order_and_marks_unknown_zips() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/locations");
            then.status(200)
                .json_body(json!([location("12345", "Albany", "NY"), null]));
        });

        let dogs = vec![
            dog("d1", "Bella", "Beagle", 3, "12345"),
            dog("d2", "Max", "Akita", 5, "99999"),
            dog("d3", "Rex", "Beagle", 2, "12345"),
        ];
        let enriched = resolver(&server.base_url())
            .enrich_dogs_with_locations(dogs)
            .await;

        assert_eq!(
            enriched.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(),
            vec!["d1", "d2", "d3"]
        );
        assert_eq!(enriched[0].city.as_deref(), Some("Albany"));
        assert_eq!(enriched[0].state.as_deref(), Some("NY"));
        assert_eq!(enriched[1].city.as_deref(), Some(UNKNOWN_PLACE));
        assert_eq!(enriched[1].state.as_deref(), Some(UNKNOWN_PLACE));
        assert_eq!(enriched[2].city.as_deref(), Some("Albany"));
        // two unique ZIPs fit one batch
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn enrichment_failure_marks_every_dog_unknown() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/locations");
            then.status(500);
        });

        let dogs = vec![
            dog("d1", "Bella", "Beagle", 3, "12345"),
            dog("d2", "Max", "Akita", 5, "12346"),
        ];
        let enriched = resolver(&server.base_url())
            .enrich_dogs_with_locations(dogs)
            .await;

        assert_eq!(enriched.len(), 2);
        for dog in &enriched {
            assert_eq!(dog.city.as_deref(), Some(UNKNOWN_PLACE));
            assert_eq!(dog.state.as_deref(), Some(UNKNOWN_PLACE));
        }
    }

    #[tokio::test]
    async fn enrichment_batches_zips_by_one_hundred() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/locations");
            then.status(200).json_body(json!([]));
        });

        let dogs: Vec<_> = (0..150)
            .map(|i| dog(&format!("d{i}"), "Rex", "Beagle", 1, &format!("{:05}", 10000 + i)))
            .collect();
        let enriched = resolver(&server.base_url())
            .enrich_dogs_with_locations(dogs)
            .await;

        assert_eq!(enriched.len(), 150);
        mock.assert_hits(2);
    }
}
