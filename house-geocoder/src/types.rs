use house_search_shared::GeoLocation;
use serde::Deserialize;

/// The LBS profile of a house: where it is and what the map popup shows.
#[derive(Debug, Clone, PartialEq)]
pub struct LbsRecord {
    pub house_id: i64,
    pub location: GeoLocation,
    pub title: String,
    pub address: String,
    pub price: i32,
    pub area: i32,
}

impl LbsRecord {
    pub fn new(
        house_id: i64,
        location: GeoLocation,
        title: impl Into<String>,
        address: impl Into<String>,
        price: i32,
        area: i32,
    ) -> Self {
        Self {
            house_id,
            location,
            title: title.into(),
            address: address.into(),
            price,
            area,
        }
    }
}

/// Identifier the LBS store assigned to a point. Returned as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PoiId {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for PoiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoiId::Number(id) => write!(f, "{}", id),
            PoiId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LbsPoi {
    #[serde(default)]
    pub id: Option<PoiId>,
}

/// Result of an LBS list query.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LbsQueryResult {
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub pois: Vec<LbsPoi>,
}

impl LbsQueryResult {
    /// Id of the first listed point, if it carries one.
    pub fn first_poi_id(&self) -> Option<&PoiId> {
        self.pois.first().and_then(|poi| poi.id.as_ref())
    }
}
