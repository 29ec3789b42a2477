//! Phase 2: rewrite references held by unmarked classes.

use jvm_classfile::ParsedClass;
use tracing::{debug, info};

use super::Phase;
use crate::error::{RelocationError, Result};
use crate::report::PhaseReport;
use crate::store::ClassStore;
use crate::table::RelocationTable;

const PHASE: Phase = Phase::Propagation;

/// Substitute `table` into every input class it does not relocate.
///
/// A class is written back at its original relative path only when at least
/// one reference changed; untouched classes produce no output.
pub fn propagate<I, O>(input: &I, output: &mut O, table: &RelocationTable) -> Result<PhaseReport>
where
    I: ClassStore + ?Sized,
    O: ClassStore + ?Sized,
{
    let paths = input
        .list_classes()
        .map_err(|e| RelocationError::storage(PHASE, ".", e))?;
    let mut report = PhaseReport::new(PHASE);

    for path in &paths {
        let bytes = input
            .read(path)
            .map_err(|e| RelocationError::storage(PHASE, path, e))?;
        let class =
            ParsedClass::parse(&bytes).map_err(|e| RelocationError::malformed(PHASE, path, e))?;
        if table.contains(class.declared_name()) {
            continue;
        }
        report.scanned += 1;

        let rewritten = class
            .substitute_names(table)
            .map_err(|e| RelocationError::malformed(PHASE, path, e))?;
        if !rewritten.changed {
            debug!(path = %path, "no relocated references");
            report.unchanged += 1;
            continue;
        }

        output
            .write(path, &rewritten.bytes)
            .map_err(|e| RelocationError::storage(PHASE, path, e))?;
        debug!(path = %path, "rewrote references");
        report.written.push(path.clone());
    }

    info!(
        scanned = report.scanned,
        rewritten = report.written.len(),
        "propagation complete"
    );
    Ok(report)
}
