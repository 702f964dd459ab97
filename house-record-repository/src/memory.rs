//! In-memory house record repository for testing and local development.
//!
//! # Example
//!
//! ```ignore
//! use house_record_repository::{InMemoryHouseRecordRepository, HouseRecordRepository};
//!
//! let records = InMemoryHouseRecordRepository::new();
//! records.insert_house(house);
//! records.insert_detail(detail);
//! records.insert_address(city);
//!
//! let found = records.find_house(42).await?;
//! ```

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::errors::RecordRepositoryError;
use crate::interfaces::HouseRecordRepository;
use crate::types::{AddressLevel, HouseDetailRecord, HouseRecord, SupportAddress};

#[derive(Default)]
struct Records {
    houses: HashMap<i64, HouseRecord>,
    details: HashMap<i64, HouseDetailRecord>,
    tags: HashMap<i64, Vec<String>>,
    addresses: Vec<SupportAddress>,
}

/// Repository backed by hash maps instead of a database.
#[derive(Default)]
pub struct InMemoryHouseRecordRepository {
    records: RwLock<Records>,
}

impl InMemoryHouseRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_house(&self, house: HouseRecord) {
        self.write().houses.insert(house.id, house);
    }

    pub fn insert_detail(&self, detail: HouseDetailRecord) {
        self.write().details.insert(detail.house_id, detail);
    }

    pub fn insert_tags(&self, house_id: i64, tags: Vec<String>) {
        self.write().tags.insert(house_id, tags);
    }

    pub fn insert_address(&self, address: SupportAddress) {
        self.write().addresses.push(address);
    }

    /// Drop a house and its detail and tags.
    pub fn remove_house(&self, house_id: i64) {
        let mut records = self.write();
        records.houses.remove(&house_id);
        records.details.remove(&house_id);
        records.tags.remove(&house_id);
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Records> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Records> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HouseRecordRepository for InMemoryHouseRecordRepository {
    async fn find_house(&self, house_id: i64) -> Result<Option<HouseRecord>, RecordRepositoryError> {
        Ok(self.read().houses.get(&house_id).cloned())
    }

    async fn find_detail(
        &self,
        house_id: i64,
    ) -> Result<Option<HouseDetailRecord>, RecordRepositoryError> {
        Ok(self.read().details.get(&house_id).cloned())
    }

    async fn find_tags(&self, house_id: i64) -> Result<Vec<String>, RecordRepositoryError> {
        Ok(self.read().tags.get(&house_id).cloned().unwrap_or_default())
    }

    async fn find_address(
        &self,
        en_name: &str,
        level: AddressLevel,
    ) -> Result<Option<SupportAddress>, RecordRepositoryError> {
        Ok(self
            .read()
            .addresses
            .iter()
            .find(|address| address.en_name == en_name && address.level == level.as_str())
            .cloned())
    }
}
