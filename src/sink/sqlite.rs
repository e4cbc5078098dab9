//! SQLite sink
//!
//! Stores records relationally: one products row per record, with child
//! rows for merchant offers and specification pairs, all tied to a run.
//! The run row carries the configuration hash so results can be traced
//! back to the settings that produced them.

use crate::record::ProductRecord;
use crate::sink::schema::initialize_schema;
use crate::sink::traits::{RecordSink, SinkError, SinkResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed record sink
pub struct SqliteSink {
    conn: Connection,
    run_id: i64,
}

impl SqliteSink {
    /// Opens or creates a database at the given path and starts a run
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `config_hash` - Hash of the configuration that drives this run
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened database with an open run row
    /// * `Err(SinkError)` - Failed to open or initialize the database
    pub fn new(path: &Path, config_hash: &str) -> Result<Self, SinkError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        let run_id = open_run(&conn, config_hash)?;

        Ok(Self { conn, run_id })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory(config_hash: &str) -> Result<Self, SinkError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        let run_id = open_run(&conn, config_hash)?;
        Ok(Self { conn, run_id })
    }
}

/// Inserts the run row and returns its id
fn open_run(conn: &Connection, config_hash: &str) -> Result<i64, rusqlite::Error> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
        params![now, config_hash, "running"],
    )?;
    Ok(conn.last_insert_rowid())
}

impl RecordSink for SqliteSink {
    fn write_record(&mut self, record: &ProductRecord) -> SinkResult<()> {
        // One transaction per record keeps the product and its child rows
        // consistent even if the process dies mid-write
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO products (run_id, product_id, name, description, brand, image, sku,
             price, currency, rating, review_count, offers_count, lowest_price, url,
             scraped_from, scraped_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                self.run_id,
                record.product_id,
                record.name,
                record.description,
                record.brand,
                record.image,
                record.sku,
                record.price,
                record.currency,
                record.rating,
                record.review_count.map(|n| n as i64),
                record.offers_count.map(|n| n as i64),
                record.lowest_price,
                record.url,
                record.scraped_from.as_str(),
                record.scraped_at.to_rfc3339(),
            ],
        )?;
        let product_row_id = tx.last_insert_rowid();

        if let Some(offers) = &record.offers {
            for offer in offers {
                tx.execute(
                    "INSERT INTO offers (product_row_id, merchant, price, currency)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![product_row_id, offer.merchant, offer.price, offer.currency],
                )?;
            }
        }

        if let Some(specs) = &record.specifications {
            for (label, value) in specs {
                tx.execute(
                    "INSERT INTO specifications (product_row_id, label, value)
                     VALUES (?1, ?2, ?3)",
                    params![product_row_id, label, value],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params!["completed", now, self.run_id],
        )?;
        Ok(())
    }
}
