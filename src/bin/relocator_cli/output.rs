//! Output formatting for class-relocator CLI
//!
//! Provides human-readable and JSON output for both commands.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;

use class_relocation::{Phase, RelocationError, RelocationReport};
use jvm_classfile::ClassSummary;

/// Print the outcome of a relocation run
pub fn print_relocation(report: &RelocationReport, json_output: bool, verbose: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "\x1b[32m✓ Relocation complete\x1b[0m (tag \x1b[36m{}\x1b[0m)",
        report.version_tag
    );
    println!("  Relocated:  {}", report.relocated_count());
    println!("  Propagated: {}", report.propagated_count());
    println!("  Fixed up:   {}", report.fixed_up_count());

    if verbose {
        if !report.table.is_empty() {
            println!("\n\x1b[1mRelocation Table:\x1b[0m");
            for (original, relocated) in report.table.iter() {
                println!("  {} -> {}", original, relocated);
            }
        }
        for phase in Phase::ALL {
            let Some(phase_report) = report.phase(phase) else {
                continue;
            };
            if phase_report.written.is_empty() {
                continue;
            }
            println!("\n\x1b[1mWritten in {}:\x1b[0m", phase);
            for path in &phase_report.written {
                println!("  {}", path);
            }
        }
    }
    Ok(())
}

/// Print a class summary and the classes it references
pub fn print_inspection(
    summary: &ClassSummary,
    references: &BTreeSet<String>,
    json_output: bool,
) -> Result<()> {
    if json_output {
        #[derive(Serialize)]
        struct InspectJson<'a> {
            #[serde(flatten)]
            summary: &'a ClassSummary,
            references: &'a BTreeSet<String>,
        }
        let out = InspectJson {
            summary,
            references,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("\x1b[1m{}\x1b[0m", summary.name);
    println!(
        "  version:    {}.{}",
        summary.major_version, summary.minor_version
    );
    if let Some(super_name) = &summary.super_name {
        println!("  extends:    {}", super_name);
    }
    if !summary.interfaces.is_empty() {
        println!("  implements: {}", summary.interfaces.join(", "));
    }
    println!("  pool slots: {}", summary.constant_pool_count);
    println!("  fields:     {}", summary.fields);
    println!("  methods:    {}", summary.methods);
    println!("  marker:     {}", if summary.has_marker { "yes" } else { "no" });

    if !references.is_empty() {
        println!("\n\x1b[1mReferenced Classes:\x1b[0m");
        for name in references {
            println!("  {}", name);
        }
    }
    Ok(())
}

/// Format an error for display, naming the phase and class path when the
/// failure came from a relocation run
pub fn format_error(error: &anyhow::Error, json_output: bool) -> String {
    let relocation = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<RelocationError>());
    let phase = relocation.and_then(RelocationError::phase);
    let path = relocation.and_then(RelocationError::path);

    if json_output {
        #[derive(Serialize)]
        struct ErrorJson<'a> {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            phase: Option<Phase>,
            #[serde(skip_serializing_if = "Option::is_none")]
            path: Option<&'a str>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            causes: Vec<String>,
        }

        let err = ErrorJson {
            error: error.to_string(),
            phase,
            path,
            causes: error.chain().skip(1).map(|c| c.to_string()).collect(),
        };
        serde_json::to_string_pretty(&err).unwrap_or_else(|_| "{}".to_string())
    } else {
        let mut out = format!("\x1b[31mError:\x1b[0m {}\n", error);
        if let Some(phase) = phase {
            out.push_str(&format!("  phase: {} ({})\n", phase.number(), phase));
        }
        if let Some(path) = path {
            out.push_str(&format!("  class: {}\n", path));
        }
        for (idx, cause) in error.chain().skip(1).enumerate() {
            if idx == 0 {
                out.push_str("Caused by:\n");
            }
            out.push_str(&format!("  {}: {}\n", idx + 1, cause));
        }
        out
    }
}
