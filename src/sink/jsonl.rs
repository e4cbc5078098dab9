//! JSON Lines sink
//!
//! Serializes each record as a single JSON object per line, in the order
//! records arrive. Every record carries the full field set, so consumers
//! can rely on a stable shape line to line.

use crate::record::ProductRecord;
use crate::sink::traits::{RecordSink, SinkError, SinkResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File-backed JSON Lines sink
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Creates the output file, truncating any previous content
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the output file
    pub fn new(path: &Path) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl RecordSink for JsonlSink {
    fn write_record(&mut self, record: &ProductRecord) -> SinkResult<()> {
        let line = serde_json::to_string(record)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
