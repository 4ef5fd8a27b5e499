//! Settings repository implementation
//!
//! Holds the mutable price-per-m² configuration value read by the budget
//! recompute step.

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

const PRICE_PER_M2_KEY: &str = "price_per_m2";

/// Trait for settings storage operations
pub trait SettingsRepository {
    /// Current price per m², if configured
    fn price_per_m2(&self) -> Result<Option<f64>>;

    /// Update the price per m²
    fn set_price_per_m2(&self, value: f64) -> Result<()>;
}

/// `SQLite` implementation of `SettingsRepository`
pub struct SqliteSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SettingsRepository for SqliteSettingsRepository<'_> {
    fn price_per_m2(&self) -> Result<Option<f64>> {
        let value = self.get_setting(PRICE_PER_M2_KEY)?;
        Ok(value.and_then(|raw| raw.parse::<f64>().ok()))
    }

    fn set_price_per_m2(&self, value: f64) -> Result<()> {
        self.set_setting(PRICE_PER_M2_KEY, &value.to_string())
    }
}
