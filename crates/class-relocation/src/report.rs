//! Run summaries.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::phases::Phase;
use crate::table::RelocationTable;

/// What a single phase did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    pub phase: Phase,
    /// Classes read and parsed
    pub scanned: usize,
    /// Output paths written, in processing order
    pub written: Vec<String>,
    /// Classes processed without producing output
    pub unchanged: usize,
}

impl PhaseReport {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            scanned: 0,
            written: Vec::new(),
            unchanged: 0,
        }
    }
}

/// Outcome of a full relocation run.
#[derive(Debug, Clone, Serialize)]
pub struct RelocationReport {
    pub version_tag: String,
    pub marker_descriptor: String,
    pub table: RelocationTable,
    pub phases: Vec<PhaseReport>,
}

impl RelocationReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseReport> {
        self.phases.iter().find(|p| p.phase == phase)
    }

    /// Every path present in the output set after the run, sorted.
    pub fn output_paths(&self) -> BTreeSet<&str> {
        self.phases
            .iter()
            .flat_map(|p| p.written.iter().map(String::as_str))
            .collect()
    }

    pub fn relocated_count(&self) -> usize {
        self.table.len()
    }

    /// Unmarked classes rewritten by propagation.
    pub fn propagated_count(&self) -> usize {
        self.phase(Phase::Propagation)
            .map(|p| p.written.len())
            .unwrap_or(0)
    }

    /// Relocated classes touched again by fixup.
    pub fn fixed_up_count(&self) -> usize {
        self.phase(Phase::Fixup).map(|p| p.written.len()).unwrap_or(0)
    }
}
