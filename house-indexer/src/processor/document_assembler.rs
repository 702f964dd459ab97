//! Document assembler.
//!
//! Loads a house with its detail, tags and address reference data, copies the fields
//! into a [`HouseDocument`] and geocodes the full address. Reads only.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::errors::AssemblyError;
use house_geocoder::{GeoService, LbsRecord};
use house_record_repository::{
    AddressLevel, HouseDetailRecord, HouseRecord, HouseRecordRepository, SupportAddress,
};
use house_search_shared::HouseDocument;

/// A house ready to be synchronized: the search document and the LBS profile.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledHouse {
    pub document: HouseDocument,
    pub lbs: LbsRecord,
}

/// Builds search documents from the record store.
pub struct DocumentAssembler {
    records: Arc<dyn HouseRecordRepository>,
    geo: Arc<dyn GeoService>,
}

impl DocumentAssembler {
    pub fn new(records: Arc<dyn HouseRecordRepository>, geo: Arc<dyn GeoService>) -> Self {
        Self { records, geo }
    }

    /// Assemble the document of one house.
    ///
    /// The suggest list is left empty; it is derived by the loader right before writing.
    #[instrument(skip(self))]
    pub async fn assemble(&self, house_id: i64) -> Result<AssembledHouse, AssemblyError> {
        let house = self
            .records
            .find_house(house_id)
            .await?
            .ok_or(AssemblyError::HouseNotFound(house_id))?;
        let detail = self
            .records
            .find_detail(house_id)
            .await?
            .ok_or(AssemblyError::DetailNotFound(house_id))?;
        let tags = self.records.find_tags(house_id).await?;

        let city = self
            .support_address(house_id, &house.city_en_name, AddressLevel::City)
            .await?;
        let region = self
            .support_address(house_id, &house.region_en_name, AddressLevel::Region)
            .await?;

        let geocode_address = format!(
            "{}{}{}{}{}",
            city.en_name, region.cn_name, house.street, house.district, detail.detail_address
        );
        let location = self.geo.resolve(&city.cn_name, &geocode_address).await?;
        debug!(lat = location.lat, lon = location.lon, "Geocoded house");

        let lbs = LbsRecord::new(
            house_id,
            location,
            format!("{}{}", house.street, house.district),
            format!(
                "{}{}{}{}",
                city.cn_name, region.cn_name, house.street, house.district
            ),
            house.price,
            house.area,
        );

        let mut document = to_document(house, detail, tags);
        document.location = Some(location);

        Ok(AssembledHouse { document, lbs })
    }

    async fn support_address(
        &self,
        house_id: i64,
        en_name: &str,
        level: AddressLevel,
    ) -> Result<SupportAddress, AssemblyError> {
        self.records
            .find_address(en_name, level)
            .await?
            .ok_or_else(|| AssemblyError::AddressNotFound {
                house_id,
                level,
                en_name: en_name.to_string(),
            })
    }
}

/// Copy record fields into a document. Location and suggest stay unset.
fn to_document(house: HouseRecord, detail: HouseDetailRecord, tags: Vec<String>) -> HouseDocument {
    HouseDocument {
        house_id: house.id,
        title: house.title,
        price: house.price,
        area: house.area,
        create_time: house.create_time,
        last_update_time: house.last_update_time,
        city_en_name: house.city_en_name,
        region_en_name: house.region_en_name,
        direction: house.direction,
        distance_to_subway: house.distance_to_subway,
        subway_line_name: detail.subway_line_name,
        subway_station_name: detail.subway_station_name,
        street: house.street,
        district: house.district,
        description: detail.description,
        layout_desc: detail.layout_desc,
        traffic: detail.traffic,
        round_service: detail.round_service,
        rent_way: detail.rent_way,
        tags,
        location: None,
        suggest: Vec::new(),
    }
}
