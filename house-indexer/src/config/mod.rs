//! Configuration and dependency wiring.

mod dependencies;
mod kafka;

pub use dependencies::{ConnectionMode, Dependencies};
pub use kafka::KafkaConnection;
