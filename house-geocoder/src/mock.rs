//! Mock geo service for testing and local development.
//!
//! Resolves every address to a fixed point unless one was registered for it, and keeps
//! uploaded LBS points in memory. Each operation can be switched to fail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use house_search_shared::GeoLocation;

use crate::types::{LbsPoi, LbsQueryResult, LbsRecord, PoiId};
use crate::{GeoError, GeoService, Result};

pub struct MockGeoService {
    default_location: GeoLocation,
    locations: RwLock<HashMap<String, GeoLocation>>,
    points: RwLock<HashMap<i64, LbsRecord>>,
    fail_resolve: AtomicBool,
    fail_upload: AtomicBool,
    fail_remove: AtomicBool,
    uploads: AtomicUsize,
    removals: AtomicUsize,
}

impl MockGeoService {
    pub fn new() -> Self {
        Self::with_default_location(GeoLocation::new(39.99, 116.48))
    }

    pub fn with_default_location(location: GeoLocation) -> Self {
        Self {
            default_location: location,
            locations: RwLock::new(HashMap::new()),
            points: RwLock::new(HashMap::new()),
            fail_resolve: AtomicBool::new(false),
            fail_upload: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
            removals: AtomicUsize::new(0),
        }
    }

    /// Register the point an address resolves to.
    pub fn register_location(&self, address: &str, location: GeoLocation) {
        self.locations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(address.to_string(), location);
    }

    pub fn set_fail_resolve(&self, fail: bool) {
        self.fail_resolve.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    /// The stored LBS point of a house.
    pub fn point(&self, house_id: i64) -> Option<LbsRecord> {
        self.points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&house_id)
            .cloned()
    }

    /// Successful uploads so far.
    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Successful removals so far.
    pub fn removal_count(&self) -> usize {
        self.removals.load(Ordering::SeqCst)
    }
}

impl Default for MockGeoService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GeoService for MockGeoService {
    async fn resolve(&self, _city: &str, address: &str) -> Result<GeoLocation> {
        if self.fail_resolve.load(Ordering::SeqCst) {
            return Err(GeoError::Status {
                status: 1,
                message: format!("no location for {}", address),
            });
        }
        let locations = self.locations.read().unwrap_or_else(PoisonError::into_inner);
        Ok(locations
            .get(address)
            .copied()
            .unwrap_or(self.default_location))
    }

    async fn upload(&self, record: &LbsRecord) -> Result<()> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(GeoError::Unavailable("lbs upload disabled".to_string()));
        }
        self.points
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.house_id, record.clone());
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exists(&self, house_id: i64) -> Result<Option<LbsQueryResult>> {
        let points = self.points.read().unwrap_or_else(PoisonError::into_inner);
        Ok(points.get(&house_id).map(|_| LbsQueryResult {
            size: 1,
            pois: vec![LbsPoi {
                id: Some(PoiId::Number(house_id)),
            }],
        }))
    }

    async fn remove(&self, house_id: i64) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(GeoError::Unavailable("lbs delete disabled".to_string()));
        }
        self.points
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&house_id);
        self.removals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
