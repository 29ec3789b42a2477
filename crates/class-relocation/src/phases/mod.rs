//! # Three-Phase Relocation Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Relocation Pipeline                          │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │ Phase 1: DISCOVERY                                                  │
//! │ - Parse every input class, reject duplicate declared names          │
//! │ - Rename marked classes to <tag>/<name>, self references only       │
//! │ - Write them at <tag>/<name>.class and build the RelocationTable    │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │ Phase 2: PROPAGATION                                                │
//! │ - Rewrite references in every unmarked input class                  │
//! │ - Write it at its original path only if its bytes changed           │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │ Phase 3: FIXUP                                                      │
//! │ - Re-read the classes written by Phase 1 from the output store      │
//! │ - Rewrite references between relocated classes, overwrite in place │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each phase finishes all of its writes before the next starts. The table is
//! only mutated in Phase 1; Phases 2 and 3 borrow it immutably.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod discovery;
pub mod fixup;
pub mod propagation;

pub use discovery::{discover, Discovery};
pub use fixup::fix_up;
pub use propagation::propagate;

/// Phase of the relocation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Phase 1: find and rename marked classes
    Discovery,
    /// Phase 2: rewrite references in unmarked classes
    Propagation,
    /// Phase 3: rewrite references between relocated classes
    Fixup,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Discovery, Phase::Propagation, Phase::Fixup];

    pub fn short_name(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Propagation => "propagation",
            Phase::Fixup => "fixup",
        }
    }

    /// 1-based position in the pipeline.
    pub fn number(&self) -> u8 {
        match self {
            Phase::Discovery => 1,
            Phase::Propagation => 2,
            Phase::Fixup => 3,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}
