//! Query DSL construction.
//!
//! Every function here is pure: it turns a request into the JSON body of a search
//! request. Execution and decoding live in [`crate::service`] and [`crate::response`].

use serde_json::{json, Map, Value};

use house_search_shared::{HouseSort, MapSearch, RentSearch, RentValueBlock, SortDirection};

/// Name of the completion suggester in suggest requests.
pub const SUGGESTION_NAME: &str = "autocomplete";

/// Name of the region terms aggregation.
pub const REGION_AGGREGATION: &str = "group_by_region";

/// Name of the district terms aggregation.
pub const DISTRICT_AGGREGATION: &str = "group_by_district";

/// Fields searched by the multi-field keyword clause.
pub const KEYWORD_FIELDS: [&str; 5] = [
    "traffic",
    "district",
    "round_service",
    "subway_line_name",
    "subway_station_name",
];

/// Boost applied to title matches.
pub const TITLE_BOOST: f64 = 2.0;

/// Upper bound on documents returned when looking a house up by id.
pub const HOUSE_LOOKUP_LIMIT: usize = 100;

/// Largest number of suggestions requested from the completion suggester.
pub const SUGGEST_LIMIT: usize = 5;

fn term(field: &str, value: impl Into<Value>) -> Value {
    json!({ "term": { field: value.into() } })
}

/// Range filter for a bucket, or `None` when the bucket leaves both sides open.
pub fn range_filter(field: &str, block: &RentValueBlock) -> Option<Value> {
    if block.is_all() {
        return None;
    }

    let mut bounds = Map::new();
    if let Some(min) = block.lower_bound() {
        bounds.insert("gte".to_string(), json!(min));
    }
    if let Some(max) = block.upper_bound() {
        bounds.insert("lte".to_string(), json!(max));
    }

    Some(json!({ "range": { field: bounds } }))
}

fn sort_clause(sort: HouseSort, direction: SortDirection) -> Value {
    json!([{ sort.field(): { "order": direction.as_str() } }])
}

/// Find every document indexed for a house.
pub fn house_lookup(house_id: i64) -> Value {
    json!({
        "query": term("house_id", house_id),
        "size": HOUSE_LOOKUP_LIMIT,
        "_source": false
    })
}

/// Filters shared by every listing query of a rental search.
pub fn rent_search_filters(search: &RentSearch) -> Vec<Value> {
    let mut filters = vec![term("city_en_name", search.city_en_name.as_str())];

    if let Some(region) = search.region_filter() {
        filters.push(term("region_en_name", region));
    }

    let area = RentValueBlock::match_area(search.area_block.as_deref());
    filters.extend(range_filter("area", &area));

    let price = RentValueBlock::match_price(search.price_block.as_deref());
    filters.extend(range_filter("price", &price));

    if search.direction > 0 {
        filters.push(term("direction", search.direction));
    }

    if search.rent_way > -1 {
        filters.push(term("rent_way", search.rent_way));
    }

    filters
}

/// Keyword relevance clauses: a boosted title match OR a match across transit,
/// amenity and district fields.
pub fn keyword_clauses(keywords: &str) -> Vec<Value> {
    vec![
        json!({
            "match": {
                "title": { "query": keywords, "boost": TITLE_BOOST }
            }
        }),
        json!({
            "multi_match": {
                "query": keywords,
                "fields": KEYWORD_FIELDS
            }
        }),
    ]
}

/// The listing query behind the rental search page.
///
/// Only `house_id` is fetched from each hit.
pub fn rent_search(search: &RentSearch) -> Value {
    let mut bool_query = Map::new();
    bool_query.insert("filter".to_string(), Value::Array(rent_search_filters(search)));

    if let Some(keywords) = search.keyword_filter() {
        bool_query.insert("should".to_string(), Value::Array(keyword_clauses(keywords)));
    }

    json!({
        "query": { "bool": bool_query },
        "sort": sort_clause(search.sort(), search.sort_direction()),
        "from": search.start,
        "size": search.page_size(),
        "_source": ["house_id"]
    })
}

/// Every house of a city, sorted and paged.
pub fn city_listing(
    city_en_name: &str,
    sort: HouseSort,
    direction: SortDirection,
    start: usize,
    size: usize,
) -> Value {
    json!({
        "query": { "bool": { "filter": [term("city_en_name", city_en_name)] } },
        "sort": sort_clause(sort, direction),
        "from": start,
        "size": size,
        "_source": ["house_id"]
    })
}

/// Houses of a city inside the map viewport.
pub fn bounded_listing(search: &MapSearch) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": [
                    term("city_en_name", search.city_en_name.as_str()),
                    {
                        "geo_bounding_box": {
                            "location": {
                                "top_left": {
                                    "lat": search.left_latitude,
                                    "lon": search.left_longitude
                                },
                                "bottom_right": {
                                    "lat": search.right_latitude,
                                    "lon": search.right_longitude
                                }
                            }
                        }
                    }
                ]
            }
        },
        "sort": sort_clause(search.sort(), search.sort_direction()),
        "from": search.start,
        "size": search.page_size(),
        "_source": ["house_id"]
    })
}

/// House counts per region of a city.
pub fn region_aggregation(city_en_name: &str) -> Value {
    json!({
        "query": { "bool": { "filter": [term("city_en_name", city_en_name)] } },
        "size": 0,
        "aggs": {
            REGION_AGGREGATION: { "terms": { "field": "region_en_name" } }
        }
    })
}

/// House count of one district within a city region.
pub fn district_aggregation(city_en_name: &str, region_en_name: &str, district: &str) -> Value {
    json!({
        "query": {
            "bool": {
                "filter": [
                    term("city_en_name", city_en_name),
                    term("region_en_name", region_en_name),
                    term("district", district)
                ]
            }
        },
        "size": 0,
        "aggs": {
            DISTRICT_AGGREGATION: { "terms": { "field": "district" } }
        }
    })
}

/// Completion suggestions for a prefix.
pub fn completion(prefix: &str) -> Value {
    json!({
        "_source": false,
        "suggest": {
            SUGGESTION_NAME: {
                "prefix": prefix,
                "completion": {
                    "field": "suggest",
                    "size": SUGGEST_LIMIT,
                    "skip_duplicates": true
                }
            }
        }
    })
}
