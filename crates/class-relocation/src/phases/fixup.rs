//! Phase 3: resolve references between relocated classes.

use jvm_classfile::ParsedClass;
use tracing::{debug, info};

use super::Phase;
use crate::error::{RelocationError, Result};
use crate::report::PhaseReport;
use crate::store::ClassStore;
use crate::table::RelocationTable;

const PHASE: Phase = Phase::Fixup;

/// Re-read each relocated class written by discovery and substitute the full
/// table, overwriting it in place when something changed.
pub fn fix_up<O>(output: &mut O, table: &RelocationTable, relocated_paths: &[String]) -> Result<PhaseReport>
where
    O: ClassStore + ?Sized,
{
    let mut report = PhaseReport::new(PHASE);

    for path in relocated_paths {
        let bytes = output
            .read(path)
            .map_err(|e| RelocationError::storage(PHASE, path, e))?;
        let class =
            ParsedClass::parse(&bytes).map_err(|e| RelocationError::malformed(PHASE, path, e))?;
        report.scanned += 1;

        let rewritten = class
            .substitute_names(table)
            .map_err(|e| RelocationError::malformed(PHASE, path, e))?;
        if !rewritten.changed {
            report.unchanged += 1;
            continue;
        }

        output
            .write(path, &rewritten.bytes)
            .map_err(|e| RelocationError::storage(PHASE, path, e))?;
        debug!(path = %path, "fixed up relocated class");
        report.written.push(path.clone());
    }

    info!(
        scanned = report.scanned,
        rewritten = report.written.len(),
        "fixup complete"
    );
    Ok(report)
}
