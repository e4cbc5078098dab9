//! Sink trait and error types
//!
//! This module defines the trait interface for record sinks and associated
//! error types.

use crate::record::ProductRecord;
use thiserror::Error;

/// Errors that can occur while writing records
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for record sink implementations
///
/// A sink receives validated product records as they are extracted and
/// persists them. `finish` is called exactly once after the crawl loop
/// drains; sinks flush buffers and close out run bookkeeping there.
pub trait RecordSink {
    /// Persists a single record
    fn write_record(&mut self, record: &ProductRecord) -> SinkResult<()>;

    /// Persists a batch of records
    ///
    /// The default implementation writes each record in turn. Backends
    /// with cheaper bulk paths override this.
    fn write_batch(&mut self, records: &[ProductRecord]) -> SinkResult<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Flushes buffered output and finalizes the sink
    fn finish(&mut self) -> SinkResult<()>;
}
