//! House search service implementation.
//!
//! This module provides the read-side API over the search index: listing queries,
//! map queries, aggregations and autocomplete.
//!
//! # Degradation
//!
//! Search is a best-effort read path. When the backend fails, returns a non-success
//! status or answers with an undecodable body, every method logs a warning and
//! returns an empty result instead of an error.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::interfaces::SearchIndexProvider;
use crate::query;
use crate::response::SearchResponse;
use house_search_shared::{
    clamp_page_size, HouseBucket, HouseSort, MapSearch, RentSearch, SearchResultPage,
    SortDirection,
};

/// The read-side service for house search.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use house_search_repository::{HouseSearchService, IndexConfig, OpenSearchProvider};
/// use house_search_shared::RentSearch;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider =
///     OpenSearchProvider::new("http://localhost:9200", IndexConfig::new("houses", 0)).await?;
/// let service = HouseSearchService::new(Arc::new(provider));
///
/// let page = service
///     .query(&RentSearch::in_city("bj").with_price_block("1000-3000"))
///     .await;
/// println!("{} houses, first page: {:?}", page.total, page.results);
/// # Ok(())
/// # }
/// ```
pub struct HouseSearchService {
    provider: Arc<dyn SearchIndexProvider>,
}

impl HouseSearchService {
    pub fn new(provider: Arc<dyn SearchIndexProvider>) -> Self {
        Self { provider }
    }

    /// Run a search body, returning `None` (after logging) when the backend fails.
    async fn execute(&self, operation: &'static str, body: &Value) -> Option<SearchResponse> {
        let raw = match self.provider.search(body).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(operation = operation, error = %e, "Search request failed, returning empty result");
                return None;
            }
        };

        match SearchResponse::from_value(raw) {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(operation = operation, error = %e, "Undecodable search response, returning empty result");
                None
            }
        }
    }

    async fn house_page(&self, operation: &'static str, body: &Value) -> SearchResultPage<i64> {
        match self.execute(operation, body).await {
            Some(response) => SearchResultPage::new(response.total(), response.house_ids()),
            None => SearchResultPage::empty(),
        }
    }

    /// Ordered house ids matching a rental search, plus the total hit count.
    #[instrument(skip(self, search), fields(city = %search.city_en_name))]
    pub async fn query(&self, search: &RentSearch) -> SearchResultPage<i64> {
        let body = query::rent_search(search);
        debug!(body = %body, "Executing rent search");
        self.house_page("query", &body).await
    }

    /// Every house of a city, sorted and paged.
    pub async fn map_query(
        &self,
        city_en_name: &str,
        order_by: &str,
        order_direction: &str,
        start: usize,
        size: usize,
    ) -> SearchResultPage<i64> {
        let body = query::city_listing(
            city_en_name,
            HouseSort::from_key(order_by),
            SortDirection::from_key(order_direction),
            start,
            clamp_page_size(size),
        );
        self.house_page("map_query", &body).await
    }

    /// Houses of a city inside a map viewport.
    #[instrument(skip(self, search), fields(city = %search.city_en_name))]
    pub async fn map_bound_query(&self, search: &MapSearch) -> SearchResultPage<i64> {
        let body = query::bounded_listing(search);
        self.house_page("map_bound_query", &body).await
    }

    /// House counts per region of a city. `total` is the number of houses in the city.
    pub async fn map_aggregate(&self, city_en_name: &str) -> SearchResultPage<HouseBucket> {
        let body = query::region_aggregation(city_en_name);
        match self.execute("map_aggregate", &body).await {
            Some(response) => SearchResultPage::new(
                response.total(),
                response.buckets(query::REGION_AGGREGATION),
            ),
            None => SearchResultPage::empty(),
        }
    }

    /// Number of houses in one district of a city region, or 0.
    pub async fn aggregate_district_house(
        &self,
        city_en_name: &str,
        region_en_name: &str,
        district: &str,
    ) -> u64 {
        let body = query::district_aggregation(city_en_name, region_en_name, district);
        let Some(response) = self.execute("aggregate_district_house", &body).await else {
            return 0;
        };

        response
            .buckets(query::DISTRICT_AGGREGATION)
            .into_iter()
            .find(|bucket| bucket.key == district)
            .map(|bucket| bucket.count)
            .unwrap_or(0)
    }

    /// Up to five distinct completion texts for a prefix.
    pub async fn suggest(&self, prefix: &str) -> Vec<String> {
        let body = query::completion(prefix);
        match self.execute("suggest", &body).await {
            Some(response) => response.suggestions(query::SUGGESTION_NAME, query::SUGGEST_LIMIT),
            None => Vec::new(),
        }
    }
}
