//! Identifier registry: external keys ↔ vertex handles, plus score slots.
//!
//! Entries live in an append-only arena. The arena position of an entry
//! is its stable iteration position, so the key snapshot and the score
//! slots share one index space. Work units address that space by range,
//! which lets the scoring engine hand each worker a disjoint `&mut` slice
//! of score slots instead of locking a shared map.

use std::collections::HashMap;

use crate::error::{CdIndexError, Result};
use crate::graph::{CitationGraph, VertexId};
use crate::temporal::Instant;

/// One registered work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub vertex: VertexId,
}

/// Score slot of one entry. Written at most once per run.
pub type ScoreSlot = Option<f64>;

/// Write a score into an unset slot.
///
/// # Panics
///
/// Panics if the slot already holds a score. Partitioning guarantees every
/// slot has exactly one owner, so a second write is a logic error.
pub fn fill_slot(slot: &mut ScoreSlot, key: &str, value: f64) {
    assert!(slot.is_none(), "score for '{key}' written twice");
    *slot = Some(value);
}

#[derive(Debug, Default)]
pub struct IdentifierRegistry {
    by_key: HashMap<String, usize>,
    entries: Vec<Entry>,
    scores: Vec<ScoreSlot>,
}

impl IdentifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_key: HashMap::with_capacity(capacity),
            entries: Vec::with_capacity(capacity),
            scores: Vec::with_capacity(capacity),
        }
    }

    /// Create a vertex for `key` in `graph` and record the association.
    ///
    /// Returns `DuplicateKey` without touching the graph if the key exists.
    pub fn register<G: CitationGraph + ?Sized>(
        &mut self,
        graph: &mut G,
        key: &str,
        created_at: Instant,
    ) -> Result<VertexId> {
        if self.by_key.contains_key(key) {
            return Err(CdIndexError::DuplicateKey(key.to_string()));
        }
        let vertex = graph.add_vertex(created_at);
        self.by_key.insert(key.to_string(), self.entries.len());
        self.entries.push(Entry {
            key: key.to_string(),
            vertex,
        });
        self.scores.push(None);
        Ok(vertex)
    }

    pub fn resolve(&self, key: &str) -> Option<VertexId> {
        self.by_key.get(key).map(|&pos| self.entries[pos].vertex)
    }

    /// Set the score of `key`. Unknown keys are ignored.
    ///
    /// # Panics
    ///
    /// Panics if the entry was already scored in this run.
    pub fn set_score(&mut self, key: &str, value: f64) {
        if let Some(&pos) = self.by_key.get(key) {
            fill_slot(&mut self.scores[pos], key, value);
        }
    }

    pub fn score(&self, key: &str) -> Option<f64> {
        self.by_key.get(key).and_then(|&pos| self.scores[pos])
    }

    /// Keys in stable iteration order.
    ///
    /// The order is the arena order, fixed once ingestion ends; positions
    /// in the returned sequence are the positions work units refer to.
    pub fn snapshot_keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entries together with their mutable score slots, position-aligned.
    pub fn entries_and_slots_mut(&mut self) -> (&[Entry], &mut [ScoreSlot]) {
        (&self.entries, &mut self.scores)
    }

    /// `(key, score)` for every entry that received a score.
    pub fn scored_entries(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries
            .iter()
            .zip(&self.scores)
            .filter_map(|(entry, score)| score.map(|s| (entry.key.as_str(), s)))
    }

    pub fn scored_count(&self) -> usize {
        self.scores.iter().filter(|s| s.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
