//! Write-side of the relational store: one `(key, score)` row per scored work.
//!
//! An export replaces the destination table wholesale inside a single
//! transaction. A failure anywhere rolls back the drop as well, leaving
//! the previous contents in place.

use std::path::Path;
use std::sync::atomic::Ordering;

use rusqlite::{params, Connection, OpenFlags};
use tracing::{info, instrument};

use crate::config::is_identifier;
use crate::error::{CdIndexError, Result};
use crate::metrics::RunMetrics;
use crate::registry::IdentifierRegistry;

/// Rows between `S` progress lines.
const PROGRESS_INTERVAL: usize = 1_000_000;

pub struct ResultExporter {
    conn: Connection,
    path: String,
    table: String,
}

impl ResultExporter {
    /// Open (creating if needed) the destination store.
    #[instrument(skip_all, fields(path = %path.display(), table = %table))]
    pub fn open(path: &Path, table: &str) -> Result<Self> {
        if !is_identifier(table) {
            return Err(CdIndexError::InvalidConfig(format!(
                "table name '{table}' is not a plain identifier"
            )));
        }
        let conn = Connection::open(path).map_err(|e| CdIndexError::DestinationUnavailable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            conn,
            path: path.display().to_string(),
            table: table.to_string(),
        })
    }

    /// Check that `open` would succeed without creating anything.
    ///
    /// An existing file must open read-write; a new file needs an
    /// existing parent directory.
    pub fn check_destination(path: &Path, table: &str) -> Result<()> {
        if !is_identifier(table) {
            return Err(CdIndexError::InvalidConfig(format!(
                "table name '{table}' is not a plain identifier"
            )));
        }
        let unavailable = |reason: String| CdIndexError::DestinationUnavailable {
            path: path.display().to_string(),
            reason,
        };
        if path.exists() {
            Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
                .map_err(|e| unavailable(e.to_string()))?;
            return Ok(());
        }
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        if !parent.is_dir() {
            return Err(unavailable(format!(
                "directory {} does not exist",
                parent.display()
            )));
        }
        Ok(())
    }

    /// Replace the destination table with `rows`. Returns the row count.
    pub fn export<'k, I>(&mut self, rows: I, metrics: &RunMetrics) -> Result<usize>
    where
        I: IntoIterator<Item = (&'k str, f64)>,
    {
        let path = self.path.clone();
        let unavailable = |e: rusqlite::Error| CdIndexError::DestinationUnavailable {
            path: path.clone(),
            reason: e.to_string(),
        };

        let tx = self.conn.transaction().map_err(unavailable)?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{t}\";
             CREATE TABLE \"{t}\" (doi TEXT PRIMARY KEY, cdindex REAL);",
            t = self.table
        ))
        .map_err(unavailable)?;

        let mut written = 0usize;
        {
            let mut stmt = tx
                .prepare(&format!("INSERT INTO \"{}\" (doi, cdindex) VALUES (?1, ?2)", self.table))
                .map_err(unavailable)?;
            for (key, score) in rows {
                if written % PROGRESS_INTERVAL == 0 {
                    info!(phase = "S", rows = written, "saving scores");
                }
                stmt.execute(params![key, score]).map_err(unavailable)?;
                written += 1;
            }
        }
        // Dropping `tx` without commit rolls everything back.
        tx.commit().map_err(unavailable)?;

        metrics.rows_exported.fetch_add(written as u64, Ordering::Relaxed);
        info!(rows = written, table = %self.table, "Scores saved");
        Ok(written)
    }

    /// Export every scored registry entry in registry order.
    pub fn export_registry(&mut self, registry: &IdentifierRegistry, metrics: &RunMetrics) -> Result<usize> {
        self.export(registry.scored_entries(), metrics)
    }

    /// All exported rows, ordered by key.
    pub fn read_rows(&self) -> Result<Vec<(String, f64)>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT doi, cdindex FROM \"{}\" ORDER BY doi", self.table))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
