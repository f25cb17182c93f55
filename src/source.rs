//! Read-side of the relational store: works as vertices, references as edges.
//!
//! Expects the Crossref-style schema
//! `works(id, doi, published_year, published_month, published_day)` and
//! `work_references(work_id, doi)`. Rows are streamed and handed to the
//! caller in fixed-size batches so the whole result set is never
//! materialized at once.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info, instrument};

use crate::builder::{EdgeRecord, VertexRecord};
use crate::error::{CdIndexError, Result};
use crate::temporal::encode;

/// Rows handed to the sink per call.
pub const INGEST_BATCH_SIZE: usize = 10_000;

/// Rows between `N` / `E` progress lines.
const PROGRESS_INTERVAL: u64 = 1_000_000;

const VERTEX_QUERY: &str = "SELECT DISTINCT doi, published_year, published_month, published_day
    FROM works
    WHERE doi IS NOT NULL AND published_year BETWEEN ?1 AND ?2";

const EDGE_QUERY: &str = "SELECT works.doi, work_references.doi
    FROM works
    INNER JOIN work_references ON works.id = work_references.work_id
    WHERE works.doi IS NOT NULL AND work_references.doi IS NOT NULL";

/// Totals of one streaming read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub rows: u64,
    pub skipped: u64,
}

pub struct WorkSource {
    conn: Connection,
    path: String,
}

impl WorkSource {
    /// Open an existing store. Never creates a file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| CdIndexError::SourceUnavailable {
            path: path.display().to_string(),
            reason,
        };
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| unavailable(e.to_string()))?;

        let tables: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('works', 'work_references')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| unavailable(e.to_string()))?;
        if tables != 2 {
            return Err(unavailable(
                "missing 'works' or 'work_references' table".to_string(),
            ));
        }

        debug!("Opened work source");
        Ok(Self {
            conn,
            path: path.display().to_string(),
        })
    }

    /// Index the join columns used by the edge query.
    pub fn create_indexes(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE INDEX IF NOT EXISTS works_id_idx ON works(id);
                 CREATE INDEX IF NOT EXISTS work_references_work_id_idx
                   ON work_references(work_id);",
            )
            .map_err(|e| self.unavailable(e))?;
        info!("Source indexes ready");
        Ok(())
    }

    /// Stream works published in `[first_year, last_year]` as vertex records.
    ///
    /// Rows whose date is not a calendar date are skipped and counted.
    pub fn read_vertices<F>(&self, first_year: i32, last_year: i32, mut sink: F) -> Result<ReadStats>
    where
        F: FnMut(Vec<VertexRecord>),
    {
        let mut stmt = self.conn.prepare(VERTEX_QUERY).map_err(|e| self.unavailable(e))?;
        let mut rows = stmt
            .query(params![first_year, last_year])
            .map_err(|e| self.unavailable(e))?;

        let mut stats = ReadStats::default();
        let mut batch = Vec::with_capacity(INGEST_BATCH_SIZE);
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let year: i32 = row.get(1)?;
            let month: Option<i64> = row.get(2)?;
            let day: Option<i64> = row.get(3)?;

            if stats.rows % PROGRESS_INTERVAL == 0 {
                info!(phase = "N", rows = stats.rows, "reading works");
            }
            stats.rows += 1;

            match encode(year, month.map(date_part), day.map(date_part)) {
                Ok(created_at) => batch.push(VertexRecord::new(key, created_at)),
                Err(e) => {
                    debug!(key = %key, error = %e, "work skipped");
                    stats.skipped += 1;
                    continue;
                }
            }
            if batch.len() == INGEST_BATCH_SIZE {
                sink(std::mem::replace(&mut batch, Vec::with_capacity(INGEST_BATCH_SIZE)));
            }
        }
        if !batch.is_empty() {
            sink(batch);
        }
        Ok(stats)
    }

    /// Stream reference edges with a non-null cited key.
    pub fn read_edges<F>(&self, mut sink: F) -> Result<ReadStats>
    where
        F: FnMut(Vec<EdgeRecord>),
    {
        let mut stmt = self.conn.prepare(EDGE_QUERY).map_err(|e| self.unavailable(e))?;
        let mut rows = stmt.query([]).map_err(|e| self.unavailable(e))?;

        let mut stats = ReadStats::default();
        let mut batch = Vec::with_capacity(INGEST_BATCH_SIZE);
        while let Some(row) = rows.next()? {
            if stats.rows % PROGRESS_INTERVAL == 0 {
                info!(phase = "E", rows = stats.rows, "reading references");
            }
            stats.rows += 1;
            batch.push(EdgeRecord::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?));
            if batch.len() == INGEST_BATCH_SIZE {
                sink(std::mem::replace(&mut batch, Vec::with_capacity(INGEST_BATCH_SIZE)));
            }
        }
        if !batch.is_empty() {
            sink(batch);
        }
        Ok(stats)
    }

    fn unavailable(&self, e: rusqlite::Error) -> CdIndexError {
        CdIndexError::SourceUnavailable {
            path: self.path.clone(),
            reason: e.to_string(),
        }
    }
}

/// Out-of-range month/day values map to 0, which no calendar accepts.
fn date_part(v: i64) -> u32 {
    u32::try_from(v).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_store(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("works.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE works(id INTEGER PRIMARY KEY, doi TEXT, published_year INTEGER,
                                published_month INTEGER, published_day INTEGER);
             CREATE TABLE work_references(work_id INTEGER, doi TEXT);
             INSERT INTO works VALUES (1, '10.1/a', 1950, 3, 14);
             INSERT INTO works VALUES (2, '10.1/b', 1960, NULL, NULL);
             INSERT INTO works VALUES (3, '10.1/c', 1930, 1, 1);
             INSERT INTO works VALUES (4, '10.1/d', 1970, 2, 30);
             INSERT INTO works VALUES (5, NULL, 1970, 1, 1);
             INSERT INTO works VALUES (6, '10.1/a', 1950, 3, 14);
             INSERT INTO work_references VALUES (1, '10.1/b');
             INSERT INTO work_references VALUES (1, NULL);
             INSERT INTO work_references VALUES (2, '10.9/elsewhere');",
        )
        .unwrap();
        path
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = WorkSource::open(&dir.path().join("nope.db")).err().unwrap();
        assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
        assert!(!dir.path().join("nope.db").exists());
    }

    #[test]
    fn test_missing_tables_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.db");
        Connection::open(&path).unwrap().execute_batch("CREATE TABLE t(x)").unwrap();
        let err = WorkSource::open(&path).err().unwrap();
        assert_eq!(err.code(), "SOURCE_UNAVAILABLE");
    }

    #[test]
    fn test_read_vertices_filters_and_decodes() {
        let dir = TempDir::new().unwrap();
        let source = WorkSource::open(&make_store(&dir)).unwrap();
        source.create_indexes().unwrap();

        let mut records = Vec::new();
        let stats = source.read_vertices(1945, 2023, |batch| records.extend(batch)).unwrap();

        // 1930 is out of range, NULL doi excluded, exact duplicate row collapsed,
        // 1970-02-30 read but skipped
        assert_eq!(stats, ReadStats { rows: 3, skipped: 1 });
        records.sort_by(|a, b| a.key.cmp(&b.key));
        assert_eq!(
            records,
            vec![
                VertexRecord::new("10.1/a", encode(1950, Some(3), Some(14)).unwrap()),
                VertexRecord::new("10.1/b", encode(1960, None, None).unwrap()),
            ]
        );
    }

    #[test]
    fn test_read_edges_skips_null_targets() {
        let dir = TempDir::new().unwrap();
        let source = WorkSource::open(&make_store(&dir)).unwrap();

        let mut edges = Vec::new();
        let stats = source.read_edges(|batch| edges.extend(batch)).unwrap();

        assert_eq!(stats.rows, 2);
        edges.sort_by(|a, b| a.target.cmp(&b.target));
        assert_eq!(
            edges,
            vec![
                EdgeRecord::new("10.1/a", "10.1/b"),
                EdgeRecord::new("10.1/b", "10.9/elsewhere"),
            ]
        );
    }

    #[test]
    fn test_batches_are_bounded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE works(id INTEGER PRIMARY KEY, doi TEXT, published_year INTEGER,
                                published_month INTEGER, published_day INTEGER);
             CREATE TABLE work_references(work_id INTEGER, doi TEXT);",
        )
        .unwrap();
        let total = INGEST_BATCH_SIZE + 5;
        {
            let tx = conn.unchecked_transaction().unwrap();
            for i in 0..total {
                tx.execute(
                    "INSERT INTO works VALUES (?1, ?2, 2000, 1, 1)",
                    params![i as i64, format!("k{i}")],
                )
                .unwrap();
            }
            tx.commit().unwrap();
        }

        let source = WorkSource::open(&path).unwrap();
        let mut sizes = Vec::new();
        source.read_vertices(1945, 2023, |batch| sizes.push(batch.len())).unwrap();
        assert_eq!(sizes, vec![INGEST_BATCH_SIZE, 5]);
    }

    #[test]
    fn test_date_part_out_of_range() {
        assert_eq!(date_part(7), 7);
        assert_eq!(date_part(-1), 0);
        assert_eq!(date_part(i64::MAX), 0);
    }
}
