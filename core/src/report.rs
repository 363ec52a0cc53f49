//! Run summaries.
//!
//! Each phase returns a `PhaseReport`; the engine collects them into a
//! `RunReport` the runner prints or dumps as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: String,
    /// Rows written per table.
    pub rows: BTreeMap<String, u64>,
    pub elapsed_ms: u64,
}

impl PhaseReport {
    pub fn new(phase: &str) -> Self {
        Self {
            phase: phase.to_string(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, table: &str, rows: u64) {
        *self.rows.entry(table.to_string()).or_insert(0) += rows;
    }

    pub fn rows_for(&self, table: &str) -> u64 {
        self.rows.get(table).copied().unwrap_or(0)
    }

    pub fn total_rows(&self) -> u64 {
        self.rows.values().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub seed: u64,
    pub started_at: String,
    pub phases: Vec<PhaseReport>,
}

impl RunReport {
    pub fn rows_for(&self, table: &str) -> u64 {
        self.phases.iter().map(|p| p.rows_for(table)).sum()
    }
}
