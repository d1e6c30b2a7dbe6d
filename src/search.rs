//! Dog search orchestration.
//!
//! Builds query parameters, runs direct or location-constrained searches,
//! and assembles the final result page. A location filter abandons
//! server-side pagination: IDs are collected across ZIP batches, merged and
//! deduplicated, then re-paginated and sorted client-side.

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexSet;
use tracing::{debug, instrument, warn};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::locations::{LocationResolver, ZIP_BATCH_SIZE};
use crate::types::{Dog, SearchParams, SearchResponse, SearchResults, SortField, SortOrder};

/// Page length applied when a search does not specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Runs dog searches against the shelter service.
///
/// The public [`SearchEngine::search`] contract is request-in/result-out and
/// never fails: upstream errors are logged and collapse to the empty result,
/// indistinguishable from a search with zero matches.
pub struct SearchEngine {
    gateway: Arc<Gateway>,
    locations: Arc<LocationResolver>,
    breeds: Mutex<Vec<String>>,
}

impl SearchEngine {
    pub fn new(gateway: Arc<Gateway>, locations: Arc<LocationResolver>) -> Self {
        Self {
            gateway,
            locations,
            breeds: Mutex::new(Vec::new()),
        }
    }

    /// Fetch all known breeds, sorted ascending.
    ///
    /// Breeds are must-succeed reference data for building filters, so
    /// unlike [`SearchEngine::search`] errors propagate to the caller.
    pub async fn fetch_breeds(&self) -> Result<Vec<String>, GatewayError> {
        let mut breeds: Vec<String> = self.gateway.get("/dogs/breeds").await?;
        breeds.sort_by(|a, b| compare_lexical(a, b));
        *self.breed_cache() = breeds.clone();
        Ok(breeds)
    }

    /// The most recently fetched breed list.
    pub fn breeds(&self) -> Vec<String> {
        self.breed_cache().clone()
    }

    /// Run one search.
    #[instrument(skip_all, fields(
        breeds = params.breeds.len(),
        state = ?params.state,
        city = ?params.city,
        page = ?params.page,
    ))]
    pub async fn search(&self, params: &SearchParams) -> SearchResults {
        let page = params.page.unwrap_or(1).max(1);
        match self.search_inner(params, page).await {
            Ok(results) => results,
            Err(err) => {
                warn!(%err, "dog search failed, returning empty results");
                SearchResults::empty(page)
            },
        }
    }

    async fn search_inner(
        &self,
        params: &SearchParams,
        page: u32,
    ) -> Result<SearchResults, GatewayError> {
        let query = build_search_query(params);
        if params.state.is_some() || params.city.is_some() {
            self.location_constrained_search(params, query, page).await
        } else {
            self.direct_search(query, page).await
        }
    }

    /// No location filter: one search call, upstream handles pagination.
    async fn direct_search(
        &self,
        query: Vec<(String, String)>,
        page: u32,
    ) -> Result<SearchResults, GatewayError> {
        let response: SearchResponse = self.gateway.get_with_query("/dogs/search", &query).await?;
        if response.result_ids.is_empty() {
            return Ok(SearchResults::empty(page));
        }

        let details: Vec<Dog> = self.gateway.post("/dogs", &response.result_ids).await?;
        let dogs = self.locations.enrich_dogs_with_locations(details).await;

        let no_results = dogs.is_empty();
        Ok(SearchResults {
            dogs,
            total: response.total,
            next: response.next,
            prev: response.prev,
            current_page: page,
            no_results,
        })
    }

    /// Location filter present: resolve ZIPs, search per ZIP batch, merge
    /// and deduplicate IDs, then paginate client-side.
    async fn location_constrained_search(
        &self,
        params: &SearchParams,
        query: Vec<(String, String)>,
        page: u32,
    ) -> Result<SearchResults, GatewayError> {
        let zip_codes = self
            .locations
            .resolve_zip_codes(&params.location_filter())
            .await;
        if zip_codes.is_empty() {
            return Ok(SearchResults::empty(page));
        }

        // Server-side pagination is meaningless once IDs are merged across
        // ZIP batches, so strip it and re-paginate after the merge.
        let base_query: Vec<(String, String)> = query
            .into_iter()
            .filter(|(key, _)| key != "size" && key != "from")
            .collect();

        let zip_codes: Vec<&str> = zip_codes.iter().map(String::as_str).collect();
        let mut dog_ids: IndexSet<String> = IndexSet::new();
        for batch in zip_codes.chunks(ZIP_BATCH_SIZE) {
            let mut batch_query = base_query.clone();
            batch_query.extend(
                batch
                    .iter()
                    .map(|zip| ("zipCodes".to_string(), (*zip).to_string())),
            );
            let response: SearchResponse = self
                .gateway
                .get_with_query("/dogs/search", &batch_query)
                .await?;
            debug!(
                zips = batch.len(),
                ids = response.result_ids.len(),
                "searched one zip batch"
            );
            dog_ids.extend(response.result_ids);
        }

        if dog_ids.is_empty() {
            return Ok(SearchResults::empty(page));
        }

        self.assemble_page(params, &dog_ids, page).await
    }

    /// Slice one page out of the merged ID set, fetch and enrich only that
    /// page's details, and sort it if a sort field was requested.
    async fn assemble_page(
        &self,
        params: &SearchParams,
        dog_ids: &IndexSet<String>,
        page: u32,
    ) -> Result<SearchResults, GatewayError> {
        let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE) as usize;
        let total = dog_ids.len();
        let (start, end) = page_bounds(page, size, total);

        let page_ids: Vec<&String> = dog_ids.iter().skip(start).take(end - start).collect();
        let details: Vec<Dog> = if page_ids.is_empty() {
            Vec::new()
        } else {
            self.gateway.post("/dogs", &page_ids).await?
        };

        let mut dogs = self.locations.enrich_dogs_with_locations(details).await;
        if let Some(field) = params.sort_field {
            sort_dogs(&mut dogs, field, params.sort_order.unwrap_or_default());
        }

        let next = (end < total).then(|| (page + 1).to_string());
        let prev = (page > 1).then(|| (page - 1).to_string());
        let no_results = dogs.is_empty();
        Ok(SearchResults {
            dogs,
            total: total as u64,
            next,
            prev,
            current_page: page,
            no_results,
        })
    }

    fn breed_cache(&self) -> MutexGuard<'_, Vec<String>> {
        self.breeds.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Render search parameters as query pairs.
///
/// `size` and `sort` are always present (defaults applied); `from` is only
/// emitted when a page was requested and is only meaningful for the direct
/// search path.
pub(crate) fn build_search_query(params: &SearchParams) -> Vec<(String, String)> {
    let size = params.size.unwrap_or(DEFAULT_PAGE_SIZE);
    let mut query = vec![("size".to_string(), size.to_string())];

    let sort_field = params.sort_field.unwrap_or(SortField::Breed);
    let sort_order = params.sort_order.unwrap_or_default();
    query.push((
        "sort".to_string(),
        format!("{}:{}", sort_field.as_str(), sort_order.as_str()),
    ));

    for breed in &params.breeds {
        query.push(("breeds".to_string(), breed.clone()));
    }
    if let Some(age_min) = params.age_min {
        query.push(("ageMin".to_string(), age_min.to_string()));
    }
    if let Some(age_max) = params.age_max {
        query.push(("ageMax".to_string(), age_max.to_string()));
    }
    if let Some(page) = params.page {
        let page = page.max(1);
        query.push(("from".to_string(), ((page - 1) * size).to_string()));
    }

    query
}

/// Index bounds of `page` (1-based, `size` items per page) within `total`
/// items, clamped so that `start <= end <= total`.
pub(crate) fn page_bounds(page: u32, size: usize, total: usize) -> (usize, usize) {
    let start = (page.saturating_sub(1) as usize)
        .saturating_mul(size)
        .min(total);
    let end = start.saturating_add(size).min(total);
    (start, end)
}

/// Case-insensitive lexical order, code points as tie break.
fn compare_lexical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sort so equal keys retain merged-ID order.
fn sort_dogs(dogs: &mut [Dog], field: SortField, order: SortOrder) {
    dogs.sort_by(|a, b| {
        let ordering = match field {
            SortField::Breed => compare_lexical(&a.breed, &b.breed),
            SortField::Name => compare_lexical(&a.name, &b.name),
            SortField::Age => a.age.cmp(&b.age),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
