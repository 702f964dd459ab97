//! # House Search Shared
//!
//! This crate defines shared data structures and types used across the house search
//! ecosystem. It includes the indexed house document, the operation messages that drive
//! index synchronization, and the read-side search request and result types.

pub mod types;

pub use types::house_document::{GeoLocation, HouseDocument, HouseSuggest};
pub use types::index_operation::{
    DecodedMessage, IndexOperation, OperationCodecError, OperationKind, MAX_RETRY,
};
pub use types::rent_search::{clamp_page_size, HouseSort, MapSearch, RentSearch, SortDirection};
pub use types::rent_value_block::RentValueBlock;
pub use types::search_result::{HouseBucket, SearchResultPage};
