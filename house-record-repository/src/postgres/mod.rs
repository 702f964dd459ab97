//! PostgreSQL implementation of the house record repository.

mod house_record_repository;

pub use house_record_repository::PostgresHouseRecordRepository;
