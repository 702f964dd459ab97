//! This module defines the core data structures and types used across the house search
//! indexer.

pub mod house_document;
pub mod index_operation;
pub mod rent_search;
pub mod rent_value_block;
pub mod search_result;
