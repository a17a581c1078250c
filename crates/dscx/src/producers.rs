//! 🚰 Producers: where records come from.
//!
//! 🧠 Knowledge graph:
//! - `RecordIdProducer` runs the listing query and hands out a `RecordIdCursor`.
//! - `DatabaseRecordSetProducer` walks that cursor, keeps the connection alive, reconnects once when it isn't.
//! - `DatabaseRecordProducer` goes the other way: indexed document → `SourceRecord`.
//! - `SourceRecord` is what every mapper receives. 🦆

mod record_ids;
mod record_producer;
mod record_set;
mod source_record;

pub use record_ids::{RecordIdCursor, RecordIdProducer};
pub use record_producer::DatabaseRecordProducer;
pub use record_set::{DatabaseRecordSetProducer, RecordSetProducer};
pub use source_record::{Ownership, SourceRecord};
