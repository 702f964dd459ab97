//! House document types for the search index.
//!
//! This module defines the denormalized document that is indexed in the search engine
//! for every house listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default weight attached to completion inputs.
pub const DEFAULT_SUGGEST_WEIGHT: i32 = 10;

/// A point on the map, serialized in the search engine's `geo_point` object form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
}

impl GeoLocation {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A single completion input registered for autocomplete.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HouseSuggest {
    pub input: String,
    #[serde(default = "default_weight")]
    pub weight: i32,
}

fn default_weight() -> i32 {
    DEFAULT_SUGGEST_WEIGHT
}

impl HouseSuggest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            weight: DEFAULT_SUGGEST_WEIGHT,
        }
    }
}

/// Document representation of a house listing in the search index.
///
/// The document is assembled from the house record, its detail record and its tags.
/// `location` is filled in after geocoding and `suggest` is derived right before the
/// document is written, so both start out empty.
///
/// # Fields
///
/// - `house_id`: Identity of the source record, also used as the document id
/// - `city_en_name` / `region_en_name`: Keyword codes used for mandatory filtering
/// - `price` / `area`: Numeric fields targeted by bucket range filters
/// - `direction` / `rent_way`: Optional equality filters
/// - `title`, `traffic`, `round_service`, ...: Full-text fields for keyword relevance
/// - `location`: Geocoded coordinates used by bounding-box queries
/// - `suggest`: Completion inputs used by autocomplete
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HouseDocument {
    pub house_id: i64,
    pub title: String,
    pub price: i32,
    pub area: i32,
    pub create_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
    pub city_en_name: String,
    pub region_en_name: String,
    pub direction: i32,
    pub distance_to_subway: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subway_line_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subway_station_name: Option<String>,
    pub street: String,
    pub district: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round_service: Option<String>,
    pub rent_way: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
    #[serde(default)]
    pub suggest: Vec<HouseSuggest>,
}

/// Fields left out of the serialized document while unset.
pub const OPTIONAL_FIELDS: [&str; 7] = [
    "subway_line_name",
    "subway_station_name",
    "description",
    "layout_desc",
    "traffic",
    "round_service",
    "location",
];

impl HouseDocument {
    /// The `doc` of a partial update.
    ///
    /// Unset optional fields are written as `null` so a value removed from the record is
    /// removed from the stored document too.
    pub fn update_fields(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(fields) = &mut value {
            for name in OPTIONAL_FIELDS {
                fields.entry(name).or_insert(Value::Null);
            }
        }
        Ok(value)
    }

    /// Generate the document ID used in the search index.
    ///
    /// One house maps to exactly one document, so the house id doubles as the
    /// document id. This keeps create and recreate writes deterministic.
    pub fn document_id(&self) -> String {
        self.house_id.to_string()
    }

    /// Text fields fed to the analyzer when deriving completion inputs, in order.
    ///
    /// Empty and missing fields are skipped.
    pub fn suggest_sources(&self) -> Vec<String> {
        [
            Some(self.title.as_str()),
            self.layout_desc.as_deref(),
            self.round_service.as_deref(),
            self.description.as_deref(),
            self.subway_line_name.as_deref(),
            self.subway_station_name.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> HouseDocument {
        HouseDocument {
            house_id: 42,
            title: "朝阳公园旁精装两居".to_string(),
            price: 2500,
            area: 60,
            city_en_name: "bj".to_string(),
            region_en_name: "cy".to_string(),
            district: "融科望京".to_string(),
            layout_desc: Some("".to_string()),
            subway_line_name: Some("14号线".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_document_id_is_house_id() {
        assert_eq!(sample().document_id(), "42");
    }

    #[test]
    fn test_suggest_sources_skip_blank_fields() {
        let sources = sample().suggest_sources();
        assert_eq!(sources, vec!["朝阳公园旁精装两居", "14号线"]);
    }

    #[test]
    fn test_serialization_omits_unset_location() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("location").is_none());
        assert_eq!(value["house_id"], json!(42));
        assert_eq!(value["city_en_name"], json!("bj"));
    }

    #[test]
    fn test_update_fields_clear_unset_options() {
        let mut doc = sample();
        doc.traffic = None;
        doc.location = None;

        let fields = doc.update_fields().unwrap();
        assert_eq!(fields["traffic"], Value::Null);
        assert_eq!(fields["location"], Value::Null);
        assert_eq!(fields["subway_line_name"], json!("14号线"));

        let restored: HouseDocument = serde_json::from_value(fields).unwrap();
        assert_eq!(restored, doc);
    }

    #[test]
    fn test_location_serializes_as_geo_point() {
        let mut doc = sample();
        doc.location = Some(GeoLocation::new(39.99, 116.48));
        doc.suggest = vec![HouseSuggest::new("望京")];

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["location"], json!({"lat": 39.99, "lon": 116.48}));
        assert_eq!(value["suggest"], json!([{"input": "望京", "weight": 10}]));
    }
}
