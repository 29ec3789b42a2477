//! Running the three phases end to end.

use tracing::info;

use crate::error::Result;
use crate::phases::{discover, fix_up, propagate};
use crate::report::RelocationReport;
use crate::store::ClassStore;
use crate::table::RelocationTable;
use crate::version_tag::{validate_marker_descriptor, validate_version_tag};

/// Annotation descriptor that marks a class for relocation unless overridden.
pub const DEFAULT_MARKER_DESCRIPTOR: &str = "Lorg/eolang/Versionized;";

/// Configured relocation run.
///
/// ```ignore
/// let report = Relocator::new("v2")
///     .marker_descriptor("Lcom/example/Versioned;")
///     .run(&DirStore::new("classes"), &mut DirStore::new("relocated"))?;
/// ```
#[derive(Debug, Clone)]
pub struct Relocator {
    version_tag: String,
    marker_descriptor: String,
}

impl Relocator {
    pub fn new(version_tag: impl Into<String>) -> Self {
        Self {
            version_tag: version_tag.into(),
            marker_descriptor: DEFAULT_MARKER_DESCRIPTOR.to_string(),
        }
    }

    pub fn marker_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.marker_descriptor = descriptor.into();
        self
    }

    /// Check the parameters without touching any store.
    pub fn validate(&self) -> Result<()> {
        validate_version_tag(&self.version_tag)?;
        validate_marker_descriptor(&self.marker_descriptor)
    }

    /// Discovery, then propagation, then fixup. Each phase completes before
    /// the next begins; a failure stops the run and leaves earlier output.
    pub fn run<I, O>(&self, input: &I, output: &mut O) -> Result<RelocationReport>
    where
        I: ClassStore + ?Sized,
        O: ClassStore + ?Sized,
    {
        self.validate()?;
        info!(
            version_tag = %self.version_tag,
            marker = %self.marker_descriptor,
            "starting relocation"
        );

        let discovery = discover(input, output, &self.version_tag, &self.marker_descriptor)?;
        let table = discovery.table;
        let propagation = propagate(input, output, &table)?;
        let fixup = fix_up(output, &table, &discovery.report.written)?;

        let report = RelocationReport {
            version_tag: self.version_tag.clone(),
            marker_descriptor: self.marker_descriptor.clone(),
            table,
            phases: vec![discovery.report, propagation, fixup],
        };
        info!(
            relocated = report.relocated_count(),
            propagated = report.propagated_count(),
            fixed_up = report.fixed_up_count(),
            "relocation complete"
        );
        Ok(report)
    }
}

/// Relocate every class in `input` marked with `marker_descriptor` under
/// `version_tag`, writing changed classes to `output`.
pub fn relocate<I, O>(
    input: &I,
    output: &mut O,
    version_tag: &str,
    marker_descriptor: &str,
) -> Result<RelocationTable>
where
    I: ClassStore + ?Sized,
    O: ClassStore + ?Sized,
{
    let report = Relocator::new(version_tag)
        .marker_descriptor(marker_descriptor)
        .run(input, output)?;
    Ok(report.table)
}
