//! Interface definitions for the house record repository.

mod house_record_repository;

pub use house_record_repository::HouseRecordRepository;
