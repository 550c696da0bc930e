//! Training-set storage
//!
//! - `sink`: the [`TrainingSink`] trait and stored row types
//! - `sled_sink`: one sled database per year on disk
//! - `memory`: in-memory sink for tests and dry runs

mod memory;
mod sink;
mod sled_sink;

pub use memory::InMemorySink;
pub use sink::{
    table_name, PartitionManifest, PartitionSummary, SinkError, StoredRecord, TrainingSink,
};
pub use sled_sink::SledSink;
