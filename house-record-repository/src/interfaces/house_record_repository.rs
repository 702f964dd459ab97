//! House record repository trait definition.

use async_trait::async_trait;

use crate::errors::RecordRepositoryError;
use crate::types::{AddressLevel, HouseDetailRecord, HouseRecord, SupportAddress};

/// Read access to house listings and the reference data they point at.
///
/// Every lookup returns `Ok(None)` (or an empty list) when nothing matches; errors are
/// reserved for failures of the store itself.
#[async_trait]
pub trait HouseRecordRepository: Send + Sync {
    async fn find_house(&self, house_id: i64) -> Result<Option<HouseRecord>, RecordRepositoryError>;

    async fn find_detail(
        &self,
        house_id: i64,
    ) -> Result<Option<HouseDetailRecord>, RecordRepositoryError>;

    /// Tag names of a house.
    async fn find_tags(&self, house_id: i64) -> Result<Vec<String>, RecordRepositoryError>;

    /// Look up a city or region by its English code.
    async fn find_address(
        &self,
        en_name: &str,
        level: AddressLevel,
    ) -> Result<Option<SupportAddress>, RecordRepositoryError>;
}
