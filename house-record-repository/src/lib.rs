//! # House Record Repository
//!
//! Read-only access to the source-of-truth house listing records: the house itself,
//! its detail record, its tags and the support addresses (cities and regions) it
//! refers to.
//!
//! The schema is owned by the listing service; this crate only reads it.

pub mod errors;
pub mod interfaces;
pub mod memory;
pub mod postgres;
pub mod types;

pub use errors::RecordRepositoryError;
pub use interfaces::HouseRecordRepository;
pub use memory::InMemoryHouseRecordRepository;
pub use postgres::PostgresHouseRecordRepository;
pub use types::{AddressLevel, HouseDetailRecord, HouseRecord, SupportAddress};
