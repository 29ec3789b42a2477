//! Phase 1: find marked classes and give each its version-qualified name.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use jvm_classfile::{ParsedClass, SingleName};
use tracing::{debug, info, warn};

use super::Phase;
use crate::error::{RelocationError, Result};
use crate::naming::{class_path, internal_name_from_path, relocated_name};
use crate::report::PhaseReport;
use crate::store::ClassStore;
use crate::table::RelocationTable;

const PHASE: Phase = Phase::Discovery;

/// Result of Phase 1.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub table: RelocationTable,
    /// `written` holds the relocated paths, which Phase 3 revisits
    pub report: PhaseReport,
}

/// Relocate every class in `input` whose class-level annotations include
/// `marker_descriptor`.
///
/// Only the class's own name is substituted here; references to other
/// marked classes are left for [`fix_up`](super::fix_up).
pub fn discover<I, O>(
    input: &I,
    output: &mut O,
    version_tag: &str,
    marker_descriptor: &str,
) -> Result<Discovery>
where
    I: ClassStore + ?Sized,
    O: ClassStore + ?Sized,
{
    let paths = input
        .list_classes()
        .map_err(|e| RelocationError::storage(PHASE, ".", e))?;

    let mut table = RelocationTable::new();
    let mut report = PhaseReport::new(PHASE);
    let mut declared: BTreeMap<String, String> = BTreeMap::new();
    let mut marked: Vec<(&String, ParsedClass, String)> = Vec::new();

    for path in &paths {
        let bytes = input
            .read(path)
            .map_err(|e| RelocationError::storage(PHASE, path, e))?;
        let class =
            ParsedClass::parse(&bytes).map_err(|e| RelocationError::malformed(PHASE, path, e))?;
        report.scanned += 1;

        let name = class.declared_name().to_string();
        match declared.entry(name.clone()) {
            Entry::Occupied(first) => {
                return Err(RelocationError::DuplicateClass {
                    name,
                    first: first.get().clone(),
                    second: path.clone(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(path.clone());
            }
        }
        if internal_name_from_path(path).as_deref() != Some(name.as_str()) {
            warn!(path = %path, declared = %name, "class name does not match its path, using declared name");
        }

        if !class.has_marker_attribute(marker_descriptor) {
            debug!(path = %path, "no marker");
            report.unchanged += 1;
            continue;
        }

        let relocated = relocated_name(version_tag, &name);
        table.insert(&name, &relocated, path)?;
        marked.push((path, class, relocated));
    }

    // A relocated name must not be taken by another input class
    for (path, _, relocated) in &marked {
        if let Some(existing) = declared.get(relocated) {
            return Err(RelocationError::DuplicateClass {
                name: relocated.clone(),
                first: existing.clone(),
                second: (*path).clone(),
            });
        }
    }

    for (path, class, relocated) in marked {
        let renamed = class
            .substitute_names(&SingleName {
                from: class.declared_name(),
                to: &relocated,
            })
            .map_err(|e| RelocationError::malformed(PHASE, path, e))?;
        let target = class_path(&relocated);
        output
            .write(&target, &renamed.bytes)
            .map_err(|e| RelocationError::storage(PHASE, &target, e))?;
        debug!(from = %path, to = %target, "relocated marked class");
        report.written.push(target);
    }

    info!(
        scanned = report.scanned,
        relocated = table.len(),
        "discovery complete"
    );
    Ok(Discovery { table, report })
}
