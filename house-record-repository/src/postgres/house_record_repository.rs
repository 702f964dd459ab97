//! PostgreSQL implementation of the house record repository.
//!
//! ## Database Tables
//!
//! - `house`: One row per listing
//! - `house_detail`: Descriptive detail, keyed by `house_id`
//! - `house_tag`: Tag names, many per house
//! - `support_address`: City and region reference data

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::errors::RecordRepositoryError;
use crate::interfaces::HouseRecordRepository;
use crate::types::{AddressLevel, HouseDetailRecord, HouseRecord, SupportAddress};

pub struct PostgresHouseRecordRepository {
    pool: PgPool,
}

impl PostgresHouseRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool and wrap it in a repository.
    ///
    /// # Arguments
    ///
    /// * `database_url` - PostgreSQL connection string
    /// * `max_connections` - Upper bound on pooled connections
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, RecordRepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!(max_connections = max_connections, "Connected to house record database");
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl HouseRecordRepository for PostgresHouseRecordRepository {
    async fn find_house(&self, house_id: i64) -> Result<Option<HouseRecord>, RecordRepositoryError> {
        let row = sqlx::query_as::<_, HouseRecord>(
            r#"
            SELECT id, title, price, area, room, floor, direction, distance_to_subway,
                   city_en_name, region_en_name, district, street,
                   create_time, last_update_time
            FROM house
            WHERE id = $1
            "#,
        )
        .bind(house_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_detail(
        &self,
        house_id: i64,
    ) -> Result<Option<HouseDetailRecord>, RecordRepositoryError> {
        let row = sqlx::query_as::<_, HouseDetailRecord>(
            r#"
            SELECT house_id, description, layout_desc, traffic, round_service, rent_way,
                   address AS detail_address, subway_line_name, subway_station_name
            FROM house_detail
            WHERE house_id = $1
            "#,
        )
        .bind(house_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_tags(&self, house_id: i64) -> Result<Vec<String>, RecordRepositoryError> {
        let tags = sqlx::query_scalar::<_, String>(
            "SELECT name FROM house_tag WHERE house_id = $1 ORDER BY id",
        )
        .bind(house_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn find_address(
        &self,
        en_name: &str,
        level: AddressLevel,
    ) -> Result<Option<SupportAddress>, RecordRepositoryError> {
        let row = sqlx::query_as::<_, SupportAddress>(
            r#"
            SELECT id, belong_to, en_name, cn_name, level
            FROM support_address
            WHERE en_name = $1 AND level = $2
            LIMIT 1
            "#,
        )
        .bind(en_name)
        .bind(level.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
