//! Inspect command - summarize a single class file

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use class_relocation::DEFAULT_MARKER_DESCRIPTOR;
use jvm_classfile::ParsedClass;

use super::output;

#[derive(Parser, Debug)]
#[command(about = "Print the header and referenced classes of one class file")]
pub struct InspectCmd {
    /// Path to a .class file
    pub class_file: PathBuf,

    /// Marker annotation descriptor to look for
    #[arg(long, value_name = "DESCRIPTOR", default_value = DEFAULT_MARKER_DESCRIPTOR)]
    pub marker: String,
}

impl InspectCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let path = &self.class_file;
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        let class = ParsedClass::parse(&bytes).with_context(|| format!("parse {}", path.display()))?;
        let references = class
            .referenced_class_names()
            .with_context(|| format!("scan references in {}", path.display()))?;

        output::print_inspection(&class.summary(&self.marker), &references, json_output)
    }
}
