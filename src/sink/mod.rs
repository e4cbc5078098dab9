//! Record sinks
//!
//! This module handles persistence of extracted product records:
//! - JSON Lines output, one record per line
//! - SQLite output with relational offer and specification tables
//! - Run bookkeeping (start time, finish time, configuration hash)

mod jsonl;
mod schema;
mod sqlite;
mod traits;

pub use jsonl::JsonlSink;
pub use schema::initialize_schema;
pub use sqlite::SqliteSink;
pub use traits::{RecordSink, SinkError, SinkResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;

/// Opens the sink named by the output configuration
///
/// # Arguments
///
/// * `output` - Output section of the configuration
/// * `config_hash` - Hash of the configuration file, recorded with SQLite runs
///
/// # Returns
///
/// * `Ok(Box<dyn RecordSink + Send>)` - Ready-to-write sink
/// * `Err(SinkError)` - Failed to create the output file or database
pub fn create_sink(
    output: &OutputConfig,
    config_hash: &str,
) -> Result<Box<dyn RecordSink + Send>, SinkError> {
    let path = Path::new(&output.path);
    match output.format {
        OutputFormat::Jsonl => Ok(Box::new(JsonlSink::new(path)?)),
        OutputFormat::Sqlite => Ok(Box::new(SqliteSink::new(path, config_hash)?)),
    }
}
