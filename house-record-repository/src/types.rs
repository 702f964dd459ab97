//! Row types read from the listing database.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A house listing.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct HouseRecord {
    pub id: i64,
    pub title: String,
    pub price: i32,
    pub area: i32,
    pub room: i32,
    pub floor: i32,
    pub direction: i32,
    pub distance_to_subway: i32,
    pub city_en_name: String,
    pub region_en_name: String,
    pub district: String,
    pub street: String,
    pub create_time: DateTime<Utc>,
    pub last_update_time: DateTime<Utc>,
}

/// Descriptive detail of a house, one per house.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct HouseDetailRecord {
    pub house_id: i64,
    pub description: Option<String>,
    pub layout_desc: Option<String>,
    pub traffic: Option<String>,
    pub round_service: Option<String>,
    pub rent_way: i32,
    pub detail_address: String,
    pub subway_line_name: Option<String>,
    pub subway_station_name: Option<String>,
}

/// Level of a support address entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressLevel {
    City,
    Region,
}

impl AddressLevel {
    /// Value stored in the `level` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressLevel::City => "city",
            AddressLevel::Region => "region",
        }
    }
}

/// Reference data naming a city or a region.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct SupportAddress {
    pub id: i64,
    /// English code of the parent city; equal to `en_name` for cities.
    pub belong_to: String,
    pub en_name: String,
    pub cn_name: String,
    pub level: String,
}
