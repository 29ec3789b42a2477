//! Relocation error taxonomy.
//!
//! Every failure raised while a run is in progress carries the [`Phase`] it
//! happened in and the storage path of the class being processed. Nothing is
//! rolled back: output written before the failure stays in place.

use std::fmt;
use std::io;

use jvm_classfile::ClassFormatError;

use crate::phases::Phase;

#[derive(Debug)]
pub enum RelocationError {
    /// A class file could not be parsed or re-emitted.
    MalformedClassFile {
        phase: Phase,
        path: String,
        source: ClassFormatError,
    },

    /// Reading, listing or writing the input or output store failed.
    Storage {
        phase: Phase,
        path: String,
        source: io::Error,
    },

    /// Two inputs declare the same class, or two relocations collide.
    DuplicateClass {
        name: String,
        /// Path (or relocated name) registered first
        first: String,
        second: String,
    },

    /// Rejected run parameter, detected before any I/O.
    InvalidConfig { field: &'static str, reason: String },
}

impl RelocationError {
    /// Phase the error was raised in, if it happened during a run.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RelocationError::MalformedClassFile { phase, .. }
            | RelocationError::Storage { phase, .. } => Some(*phase),
            RelocationError::DuplicateClass { .. } | RelocationError::InvalidConfig { .. } => None,
        }
    }

    /// Storage path of the class involved, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            RelocationError::MalformedClassFile { path, .. }
            | RelocationError::Storage { path, .. } => Some(path),
            _ => None,
        }
    }

    pub(crate) fn malformed(phase: Phase, path: &str, source: ClassFormatError) -> Self {
        RelocationError::MalformedClassFile {
            phase,
            path: path.to_string(),
            source,
        }
    }

    pub(crate) fn storage(phase: Phase, path: &str, source: io::Error) -> Self {
        RelocationError::Storage {
            phase,
            path: path.to_string(),
            source,
        }
    }
}

impl fmt::Display for RelocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelocationError::MalformedClassFile { phase, path, source } => {
                write!(f, "[{}] malformed class file {}: {}", phase, path, source)
            }
            RelocationError::Storage { phase, path, source } => {
                write!(f, "[{}] storage error at {}: {}", phase, path, source)
            }
            RelocationError::DuplicateClass {
                name,
                first,
                second,
            } => write!(
                f,
                "duplicate class {}: already registered by {}, again by {}",
                name, first, second
            ),
            RelocationError::InvalidConfig { field, reason } => {
                write!(f, "invalid {}: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for RelocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelocationError::MalformedClassFile { source, .. } => Some(source),
            RelocationError::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, RelocationError>;
