//! Relocate command - run discovery, propagation and fixup over a class tree

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use class_relocation::{DirStore, Relocator};
use class_relocator::RelocatorConfig;

use super::output;

#[derive(Parser, Debug)]
#[command(about = "Relocate marked classes and propagate the new names")]
pub struct RelocateCmd {
    /// Directory holding the compiled classes
    #[arg(long, value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Directory receiving relocated and rewritten classes
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Prefix segment for relocated names, e.g. "qwerty" gives qwerty/org/example/A
    #[arg(long, value_name = "TAG", conflicts_with = "tag_from_content")]
    pub version_tag: Option<String>,

    /// Derive the version tag from a hash of the input classes
    #[arg(long)]
    pub tag_from_content: bool,

    /// Marker annotation descriptor (default: Lorg/eolang/Versionized;)
    #[arg(long, value_name = "DESCRIPTOR")]
    pub marker: Option<String>,

    /// JSON configuration file; flags override its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the run report (relocation table and per-phase output) as JSON
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,
}

impl RelocateCmd {
    fn overrides(&self) -> RelocatorConfig {
        RelocatorConfig {
            input_dir: self.input_dir.clone(),
            output_dir: self.output_dir.clone(),
            version_tag: self.version_tag.clone(),
            marker_descriptor: self.marker.clone(),
        }
    }

    pub fn execute(&self, json_output: bool, verbose: bool) -> Result<()> {
        let file_config = match &self.config {
            Some(path) => RelocatorConfig::load(path)?,
            None => RelocatorConfig::default(),
        };
        let run = file_config
            .merge(self.overrides())
            .resolve(self.tag_from_content)?;

        let input = DirStore::new(&run.input_dir);
        let mut output_store = DirStore::new(&run.output_dir);
        let version_tag = run.version_tag.resolve(&input)?;

        let report = Relocator::new(version_tag)
            .marker_descriptor(run.marker_descriptor.as_str())
            .run(&input, &mut output_store)
            .with_context(|| {
                format!(
                    "relocate {} into {}",
                    run.input_dir.display(),
                    run.output_dir.display()
                )
            })?;

        if let Some(path) = &self.report {
            let json = serde_json::to_string_pretty(&report)?;
            fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        }

        output::print_relocation(&report, json_output, verbose)
    }
}
