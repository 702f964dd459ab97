//! Processor module for the house indexer.
//!
//! Turns a house id into a search document plus its LBS profile.

mod document_assembler;

pub use document_assembler::{AssembledHouse, DocumentAssembler};
