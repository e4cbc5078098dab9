//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the SQLite sink.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per emitted product record
CREATE TABLE IF NOT EXISTS products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    product_id TEXT,
    name TEXT NOT NULL,
    description TEXT,
    brand TEXT,
    image TEXT,
    sku TEXT,
    price REAL,
    currency TEXT NOT NULL,
    rating REAL,
    review_count INTEGER,
    offers_count INTEGER,
    lowest_price REAL,
    url TEXT NOT NULL,
    scraped_from TEXT NOT NULL,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_run ON products(run_id);
CREATE INDEX IF NOT EXISTS idx_products_product_id ON products(product_id);

-- Merchant offers attached to a product row
CREATE TABLE IF NOT EXISTS offers (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_row_id INTEGER NOT NULL REFERENCES products(id),
    merchant TEXT NOT NULL,
    price REAL NOT NULL,
    currency TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_offers_product ON offers(product_row_id);

-- Specification label/value pairs attached to a product row
CREATE TABLE IF NOT EXISTS specifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    product_row_id INTEGER NOT NULL REFERENCES products(id),
    label TEXT NOT NULL,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_specifications_product ON specifications(product_row_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
