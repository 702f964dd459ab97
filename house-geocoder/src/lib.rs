//! Geocoding and LBS synchronization for house listings.
//!
//! This crate provides:
//! - [`GeoService`] trait for abstracting the map provider
//! - [`BaiduMapClient`] production client speaking the Baidu geocoding and geodata APIs
//! - [`MockGeoService`] in-memory client for testing with configurable failures
//!
//! ## Usage
//!
//! ```ignore
//! use house_geocoder::{BaiduMapClient, BaiduMapConfig, GeoService, LbsRecord};
//!
//! let geo = BaiduMapClient::new(BaiduMapConfig::new(ak, geotable_id))?;
//!
//! let location = geo.resolve("北京", "bj朝阳区阜通东大街望京SOHO").await?;
//! geo.upload(&LbsRecord::new(42, location, title, address, 2500, 60)).await?;
//! ```

mod baidu;
mod mock;
mod types;

pub use baidu::{
    BaiduMapClient, BaiduMapConfig, DEFAULT_GEOCODE_URL, DEFAULT_HTTP_TIMEOUT,
    DEFAULT_LBS_BASE_URL,
};
pub use mock::MockGeoService;
pub use types::{LbsPoi, LbsQueryResult, LbsRecord, PoiId};

use async_trait::async_trait;
use house_search_shared::GeoLocation;

#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("unexpected http status {status}: {body}")]
    Http { status: u16, body: String },
    #[error("map api returned status {status}: {message}")]
    Status { status: i64, message: String },
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, GeoError>;

/// Access to a forward geocoder and the LBS point store that mirrors house locations.
///
/// None of the operations retry internally; a failed call is reported to the caller.
#[async_trait]
pub trait GeoService: Send + Sync {
    /// Resolve a free-text address within a city to map coordinates.
    async fn resolve(&self, city: &str, address: &str) -> Result<GeoLocation>;

    /// Create or update the LBS point of a house.
    async fn upload(&self, record: &LbsRecord) -> Result<()>;

    /// Look up the LBS point of a house. `None` when the store has no entry.
    async fn exists(&self, house_id: i64) -> Result<Option<LbsQueryResult>>;

    /// Delete the LBS point of a house.
    async fn remove(&self, house_id: i64) -> Result<()>;
}
