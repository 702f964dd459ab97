//! Baidu map client.
//!
//! Geocoding goes through the v3 geocoding API; LBS points live in a geodata v4 table
//! (`poi/create`, `poi/update`, `poi/delete`, `poi/list`). Every response carries a
//! `status` field and only `0` means success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::types::{LbsQueryResult, LbsRecord};
use crate::{GeoError, GeoService, Result};
use house_search_shared::GeoLocation;

pub const DEFAULT_GEOCODE_URL: &str = "http://api.map.baidu.com/geocoding/v3/";
pub const DEFAULT_LBS_BASE_URL: &str = "http://api.map.baidu.com/geodata/v4";
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Baidu coordinate system (bd09ll).
const COORD_TYPE: &str = "3";

#[derive(Debug, Clone)]
pub struct BaiduMapConfig {
    pub ak: String,
    pub geotable_id: String,
    pub geocode_url: String,
    pub lbs_base_url: String,
    pub timeout: Duration,
}

impl BaiduMapConfig {
    pub fn new(ak: impl Into<String>, geotable_id: impl Into<String>) -> Self {
        Self {
            ak: ak.into(),
            geotable_id: geotable_id.into(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            lbs_base_url: DEFAULT_LBS_BASE_URL.to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_geocode_url(mut self, url: impl Into<String>) -> Self {
        self.geocode_url = url.into();
        self
    }

    pub fn with_lbs_base_url(mut self, url: impl Into<String>) -> Self {
        self.lbs_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn lbs_url(&self, action: &str) -> String {
        format!("{}/poi/{}", self.lbs_base_url, action)
    }
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    status: i64,
    #[serde(default, alias = "msg")]
    message: Option<String>,
}

impl StatusEnvelope {
    fn into_result(self) -> Result<()> {
        if self.status == 0 {
            return Ok(());
        }
        Err(GeoError::Status {
            status: self.status,
            message: self.message.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeBody {
    result: GeocodeResult,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    location: GeocodePoint,
}

#[derive(Debug, Deserialize)]
struct GeocodePoint {
    lng: f64,
    lat: f64,
}

/// Production map client.
///
/// # Example
///
/// ```ignore
/// use house_geocoder::{BaiduMapClient, BaiduMapConfig, GeoService};
///
/// let client = BaiduMapClient::new(BaiduMapConfig::new("my-ak", "1000006426"))?;
/// let location = client.resolve("北京", "bj朝阳区阜通东大街").await?;
/// ```
pub struct BaiduMapClient {
    config: BaiduMapConfig,
    client: ReqwestClient,
}

impl BaiduMapClient {
    pub fn new(config: BaiduMapConfig) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Read the body of a response, failing on a non-2xx status.
    async fn read_body(response: Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GeoError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    /// Read a body and check its `status` field.
    async fn read_checked(response: Response) -> Result<String> {
        let body = Self::read_body(response).await?;
        serde_json::from_str::<StatusEnvelope>(&body)?.into_result()?;
        Ok(body)
    }

    async fn post_form(&self, action: &str, form: &[(&str, String)]) -> Result<()> {
        let response = self
            .client
            .post(self.config.lbs_url(action))
            .form(form)
            .send()
            .await?;
        Self::read_checked(response).await.map(|_| ())
    }

    fn base_form(&self, house_id: i64) -> Vec<(&'static str, String)> {
        vec![
            ("geotable_id", self.config.geotable_id.clone()),
            ("ak", self.config.ak.clone()),
            ("houseId", house_id.to_string()),
        ]
    }
}

#[async_trait]
impl GeoService for BaiduMapClient {
    #[instrument(skip(self))]
    async fn resolve(&self, city: &str, address: &str) -> Result<GeoLocation> {
        let response = self
            .client
            .get(&self.config.geocode_url)
            .query(&[
                ("address", address),
                ("city", city),
                ("output", "json"),
                ("ak", self.config.ak.as_str()),
            ])
            .send()
            .await?;

        let body = Self::read_checked(response).await?;
        let point = serde_json::from_str::<GeocodeBody>(&body)?.result.location;
        debug!(lat = point.lat, lng = point.lng, "Resolved address");
        Ok(GeoLocation::new(point.lat, point.lng))
    }

    #[instrument(skip(self, record), fields(house_id = record.house_id))]
    async fn upload(&self, record: &LbsRecord) -> Result<()> {
        let mut form = self.base_form(record.house_id);
        form.extend([
            ("latitude", record.location.lat.to_string()),
            ("longitude", record.location.lon.to_string()),
            ("coord_type", COORD_TYPE.to_string()),
            ("price", record.price.to_string()),
            ("area", record.area.to_string()),
            ("title", record.title.clone()),
            ("address", record.address.clone()),
        ]);

        let existing = self.exists(record.house_id).await?;
        let action = match existing.as_ref().and_then(LbsQueryResult::first_poi_id) {
            Some(poi_id) => {
                form.push(("id", poi_id.to_string()));
                "update"
            }
            None => "create",
        };

        if let Err(e) = self.post_form(action, &form).await {
            error!(action = action, error = %e, "Failed to upload LBS point");
            return Err(e);
        }
        info!(action = action, "Uploaded LBS point");
        Ok(())
    }

    async fn exists(&self, house_id: i64) -> Result<Option<LbsQueryResult>> {
        let house_filter = format!("{},{}", house_id, house_id);
        let response = self
            .client
            .get(self.config.lbs_url("list"))
            .query(&[
                ("geotable_id", self.config.geotable_id.as_str()),
                ("ak", self.config.ak.as_str()),
                ("houseId", house_filter.as_str()),
            ])
            .send()
            .await?;

        let body = Self::read_checked(response).await?;
        let result: LbsQueryResult = serde_json::from_str(&body)?;
        if result.size == 0 {
            return Ok(None);
        }
        Ok(Some(result))
    }

    #[instrument(skip(self))]
    async fn remove(&self, house_id: i64) -> Result<()> {
        let mut form = self.base_form(house_id);
        if let Some(result) = self.exists(house_id).await? {
            if let Some(poi_id) = result.first_poi_id() {
                form.push(("id", poi_id.to_string()));
            }
        }

        if let Err(e) = self.post_form("delete", &form).await {
            error!(error = %e, "Failed to delete LBS point");
            return Err(e);
        }
        info!("Deleted LBS point");
        Ok(())
    }
}
