//! Search request types for the read side.
//!
//! This module defines the structured query for the rental listing page
//! ([`RentSearch`]), the map viewport query ([`MapSearch`]) and their sort options.

use serde::{Deserialize, Serialize};

/// Sentinel region selector meaning "any region".
pub const ANY_REGION: &str = "*";

/// Page size used when the request asks for less than one result.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Largest page size a request may ask for.
pub const MAX_PAGE_SIZE: usize = 100;

/// Sort keys accepted by listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HouseSort {
    #[default]
    LastUpdateTime,
    CreateTime,
    Price,
    Area,
    DistanceToSubway,
}

impl HouseSort {
    /// Resolve a sort key from a request. Unknown keys fall back to the default.
    ///
    /// Both the camelCase request form (`lastUpdateTime`) and the index field name
    /// (`last_update_time`) are accepted.
    pub fn from_key(key: &str) -> Self {
        match key {
            "createTime" | "create_time" => HouseSort::CreateTime,
            "price" => HouseSort::Price,
            "area" => HouseSort::Area,
            "distanceToSubway" | "distance_to_subway" => HouseSort::DistanceToSubway,
            _ => HouseSort::LastUpdateTime,
        }
    }

    /// The index field this sort key orders by.
    pub fn field(&self) -> &'static str {
        match self {
            HouseSort::LastUpdateTime => "last_update_time",
            HouseSort::CreateTime => "create_time",
            HouseSort::Price => "price",
            HouseSort::Area => "area",
            HouseSort::DistanceToSubway => "distance_to_subway",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse. Anything other than `asc` sorts descending.
    pub fn from_key(key: &str) -> Self {
        if key.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

fn default_rent_way() -> i32 {
    -1
}

fn default_order_by() -> String {
    "lastUpdateTime".to_string()
}

fn default_order_direction() -> String {
    "desc".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_map_level() -> String {
    "city".to_string()
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
///
/// A size below one means "not specified" and yields [`DEFAULT_PAGE_SIZE`].
pub fn clamp_page_size(size: usize) -> usize {
    if size < 1 {
        DEFAULT_PAGE_SIZE
    } else {
        size.min(MAX_PAGE_SIZE)
    }
}

/// Structured query behind the rental listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RentSearch {
    /// Mandatory city code.
    pub city_en_name: String,

    /// Region code, or `*` / absent for any region.
    #[serde(default)]
    pub region_en_name: Option<String>,

    /// Price bucket key, see [`crate::RentValueBlock::PRICE_BLOCKS`].
    #[serde(default)]
    pub price_block: Option<String>,

    /// Area bucket key, see [`crate::RentValueBlock::AREA_BLOCKS`].
    #[serde(default)]
    pub area_block: Option<String>,

    /// Orientation code; only values greater than zero filter.
    #[serde(default)]
    pub direction: i32,

    /// Rental way code; only values greater than -1 filter.
    #[serde(default = "default_rent_way")]
    pub rent_way: i32,

    #[serde(default)]
    pub keywords: Option<String>,

    #[serde(default = "default_order_by")]
    pub order_by: String,

    #[serde(default = "default_order_direction")]
    pub order_direction: String,

    #[serde(default)]
    pub start: usize,

    #[serde(default = "default_page_size")]
    pub size: usize,
}

impl RentSearch {
    /// A query over every house in a city with default paging and sorting.
    pub fn in_city(city_en_name: impl Into<String>) -> Self {
        Self {
            city_en_name: city_en_name.into(),
            region_en_name: None,
            price_block: None,
            area_block: None,
            direction: 0,
            rent_way: default_rent_way(),
            keywords: None,
            order_by: default_order_by(),
            order_direction: default_order_direction(),
            start: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_region(mut self, region_en_name: impl Into<String>) -> Self {
        self.region_en_name = Some(region_en_name.into());
        self
    }

    pub fn with_price_block(mut self, key: impl Into<String>) -> Self {
        self.price_block = Some(key.into());
        self
    }

    pub fn with_area_block(mut self, key: impl Into<String>) -> Self {
        self.area_block = Some(key.into());
        self
    }

    pub fn with_keywords(mut self, keywords: impl Into<String>) -> Self {
        self.keywords = Some(keywords.into());
        self
    }

    pub fn with_order(mut self, order_by: impl Into<String>, direction: impl Into<String>) -> Self {
        self.order_by = order_by.into();
        self.order_direction = direction.into();
        self
    }

    pub fn with_page(mut self, start: usize, size: usize) -> Self {
        self.start = start;
        self.size = size;
        self
    }

    /// The region filter, if any. The wildcard sentinel and blank values yield `None`.
    pub fn region_filter(&self) -> Option<&str> {
        self.region_en_name
            .as_deref()
            .map(str::trim)
            .filter(|region| !region.is_empty() && *region != ANY_REGION)
    }

    /// Trimmed keywords, if any are present.
    pub fn keyword_filter(&self) -> Option<&str> {
        self.keywords
            .as_deref()
            .map(str::trim)
            .filter(|keywords| !keywords.is_empty())
    }

    pub fn sort(&self) -> HouseSort {
        HouseSort::from_key(&self.order_by)
    }

    pub fn sort_direction(&self) -> SortDirection {
        SortDirection::from_key(&self.order_direction)
    }

    pub fn page_size(&self) -> usize {
        clamp_page_size(self.size)
    }
}

/// Map viewport query: houses of a city inside a bounding box.
///
/// The box is given by its top-left (`left_*`) and bottom-right (`right_*`) corners.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapSearch {
    pub city_en_name: String,

    /// Map zoom level, `city` or `region`.
    #[serde(default = "default_map_level")]
    pub level: String,

    #[serde(default = "default_order_by")]
    pub order_by: String,

    #[serde(default = "default_order_direction")]
    pub order_direction: String,

    #[serde(default)]
    pub start: usize,

    #[serde(default = "default_page_size")]
    pub size: usize,

    pub left_latitude: f64,
    pub left_longitude: f64,
    pub right_latitude: f64,
    pub right_longitude: f64,
}

impl MapSearch {
    pub fn sort(&self) -> HouseSort {
        HouseSort::from_key(&self.order_by)
    }

    pub fn sort_direction(&self) -> SortDirection {
        SortDirection::from_key(&self.order_direction)
    }

    pub fn page_size(&self) -> usize {
        clamp_page_size(self.size)
    }
}
