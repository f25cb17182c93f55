//! Run metrics for the scoring pipeline
//!
//! Lightweight, thread-safe counters shared by every phase of a run.
//! Counters are `AtomicU64` so scoring workers can bump them without
//! coordination; phase timings are appended from the driving thread only.
//!
//! # Example
//!
//! ```no_run
//! use cdindex::metrics::RunMetrics;
//!
//! let metrics = RunMetrics::new();
//! metrics.vertices_added.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!
//! let snapshot = metrics.snapshot();
//! println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Counters for one run. Create one per run and pass it by reference.
pub struct RunMetrics {
    // Ingestion
    pub vertices_added: AtomicU64,
    pub duplicate_keys: AtomicU64,
    pub invalid_dates: AtomicU64,
    pub edges_added: AtomicU64,
    pub dangling_edges: AtomicU64,

    // Scoring
    pub work_units: AtomicU64,
    /// Keys visited by scoring workers, eligible or not.
    pub keys_processed: AtomicU64,
    pub scored: AtomicU64,
    pub ineligible: AtomicU64,
    pub scoring_failures: AtomicU64,

    // Export
    pub rows_exported: AtomicU64,

    phases: Mutex<Vec<PhaseTiming>>,
    started_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: String,
    pub duration_ms: u64,
}

/// Point-in-time copy of all counters, suitable for JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub vertices_added: u64,
    pub duplicate_keys: u64,
    pub invalid_dates: u64,
    pub edges_added: u64,
    pub dangling_edges: u64,
    pub work_units: u64,
    pub keys_processed: u64,
    pub scored: u64,
    pub ineligible: u64,
    pub scoring_failures: u64,
    pub rows_exported: u64,
    pub phases: Vec<PhaseTiming>,
    pub elapsed_ms: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            vertices_added: AtomicU64::new(0),
            duplicate_keys: AtomicU64::new(0),
            invalid_dates: AtomicU64::new(0),
            edges_added: AtomicU64::new(0),
            dangling_edges: AtomicU64::new(0),
            work_units: AtomicU64::new(0),
            keys_processed: AtomicU64::new(0),
            scored: AtomicU64::new(0),
            ineligible: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            rows_exported: AtomicU64::new(0),
            phases: Mutex::new(Vec::new()),
            started_at: Instant::now(),
        }
    }

    /// Record how long a named phase took.
    pub fn record_phase(&self, phase: &str, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        if let Ok(mut phases) = self.phases.lock() {
            phases.push(PhaseTiming {
                phase: phase.to_string(),
                duration_ms,
            });
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            vertices_added: load(&self.vertices_added),
            duplicate_keys: load(&self.duplicate_keys),
            invalid_dates: load(&self.invalid_dates),
            edges_added: load(&self.edges_added),
            dangling_edges: load(&self.dangling_edges),
            work_units: load(&self.work_units),
            keys_processed: load(&self.keys_processed),
            scored: load(&self.scored),
            ineligible: load(&self.ineligible),
            scoring_failures: load(&self.scoring_failures),
            rows_exported: load(&self.rows_exported),
            phases: self.phases.lock().map(|p| p.clone()).unwrap_or_default(),
            elapsed_ms: self.started_at.elapsed().as_millis() as u64,
        }
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Bump `counter` by `delta` and report whether the running total crossed
/// a multiple of `interval`. Lock-free; exactly one caller observes each
/// crossing.
pub fn advance_progress(counter: &AtomicU64, delta: u64, interval: u64) -> Option<u64> {
    let before = counter.fetch_add(delta, Ordering::Relaxed);
    let after = before + delta;
    if interval > 0 && before / interval != after / interval {
        Some(after)
    } else {
        None
    }
}
