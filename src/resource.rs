//! System resource detection and scoring-thread tuning.
//!
//! Detects available RAM and CPU cores and derives how many workers the
//! scoring engine should run. Stateless: each call to
//! `ResourceManager::auto_tune()` re-probes the system.

use sysinfo::{MemoryRefreshKind, RefreshKind, System};

const GB: u64 = 1024 * 1024 * 1024;

/// Memory pressure above which the worker count is halved.
const HIGH_MEMORY_PRESSURE: f64 = 0.9;

/// Estimated resident bytes per registered work (key, entry, slot, CSR rows).
pub const BYTES_PER_VERTEX: u64 = 96;

/// Estimated resident bytes per reference edge (buffer + both CSR arrays).
pub const BYTES_PER_EDGE: u64 = 16;

// ── SystemResources ─────────────────────────────────────────────────

/// Snapshot of detected hardware resources.
#[derive(Debug, Clone)]
pub struct SystemResources {
    /// Total physical RAM in bytes.
    pub total_memory_bytes: u64,
    /// Available (re-usable) RAM in bytes.
    pub available_memory_bytes: u64,
    /// Logical CPU count.
    pub cpu_count: usize,
}

impl SystemResources {
    /// Probe the current system for RAM and CPU information.
    pub fn detect() -> Self {
        let mut sys = System::new_with_specifics(
            RefreshKind::new().with_memory(MemoryRefreshKind::everything()),
        );
        sys.refresh_memory();

        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            total_memory_bytes: sys.total_memory(),
            available_memory_bytes: sys.available_memory(),
            cpu_count,
        }
    }

    /// Memory pressure indicator (0.0 = no pressure, 1.0 = critical).
    pub fn memory_pressure(&self) -> f64 {
        if self.total_memory_bytes == 0 {
            return 1.0;
        }
        let ratio = self.available_memory_bytes as f64 / self.total_memory_bytes as f64;
        (1.0 - ratio).clamp(0.0, 1.0)
    }

    /// Whether an in-memory graph of the given size is likely to fit.
    pub fn fits(&self, vertices: u64, edges: u64) -> bool {
        let need = vertices
            .saturating_mul(BYTES_PER_VERTEX)
            .saturating_add(edges.saturating_mul(BYTES_PER_EDGE));
        need <= self.available_memory_bytes
    }
}

// ── TuningProfile ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TuningProfile {
    /// Worker threads for the scoring engine.
    pub scoring_threads: usize,
    /// Memory pressure at detection time (0.0 = no pressure, 1.0 = critical).
    pub memory_pressure: f64,
}

impl TuningProfile {
    /// Heuristics:
    /// - one scoring thread per logical CPU;
    /// - halved (min 1) when RAM < 2 GB or memory pressure exceeds 0.9,
    ///   since every worker keeps its own scratch buffers.
    pub fn from_resources(res: &SystemResources) -> Self {
        let pressure = res.memory_pressure();
        let mut threads = res.cpu_count.max(1);
        if res.total_memory_bytes < 2 * GB || pressure > HIGH_MEMORY_PRESSURE {
            threads = (threads / 2).max(1);
        }
        Self {
            scoring_threads: threads,
            memory_pressure: pressure,
        }
    }
}

impl Default for TuningProfile {
    fn default() -> Self {
        Self {
            scoring_threads: 1,
            memory_pressure: 0.0,
        }
    }
}

// ── ResourceManager ─────────────────────────────────────────────────

pub struct ResourceManager;

impl ResourceManager {
    /// Probe the system and return an adaptive tuning profile.
    pub fn auto_tune() -> TuningProfile {
        TuningProfile::from_resources(&SystemResources::detect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_resources(total_gb: f64, available_gb: f64, cpus: usize) -> SystemResources {
        SystemResources {
            total_memory_bytes: (total_gb * GB as f64) as u64,
            available_memory_bytes: (available_gb * GB as f64) as u64,
            cpu_count: cpus,
        }
    }

    #[test]
    fn test_system_resources_detection() {
        let res = SystemResources::detect();
        assert!(res.cpu_count >= 1, "cpu count must be at least 1");
    }

    #[test]
    fn test_one_thread_per_cpu() {
        let profile = TuningProfile::from_resources(&make_resources(64.0, 32.0, 16));
        assert_eq!(profile.scoring_threads, 16);
    }

    #[test]
    fn test_low_memory_halves_threads() {
        let profile = TuningProfile::from_resources(&make_resources(1.0, 0.5, 8));
        assert_eq!(profile.scoring_threads, 4);

        let profile = TuningProfile::from_resources(&make_resources(16.0, 0.5, 8));
        assert_eq!(profile.scoring_threads, 4);

        let profile = TuningProfile::from_resources(&make_resources(1.0, 0.5, 1));
        assert_eq!(profile.scoring_threads, 1);
    }

    #[test]
    fn test_memory_pressure() {
        let pressure = make_resources(1.0, 0.25, 2).memory_pressure();
        assert!((pressure - 0.75).abs() < 1e-9, "got {pressure}");
        assert_eq!(make_resources(0.0, 0.0, 1).memory_pressure(), 1.0);
    }

    #[test]
    fn test_fits_estimate() {
        let res = make_resources(8.0, 1.0, 4);
        assert!(res.fits(1_000_000, 10_000_000));
        assert!(!res.fits(100_000_000, 1_000_000_000));
        assert!(!res.fits(u64::MAX, u64::MAX));
    }

    #[test]
    fn test_default_profile_is_sequential() {
        assert_eq!(TuningProfile::default().scoring_threads, 1);
    }
}
