//! class-relocator: relocate version-marked classes in a compiled class tree
//!
//! Classes annotated with the marker (default `@org.eolang.Versionized`) are
//! moved under `<tag>/` and every class that refers to them is rewritten, so
//! several builds of one library can share a classpath.
//!
//! ## Example Usage
//!
//! ```bash
//! # Relocate marked classes under qwerty/
//! class-relocator relocate --input-dir target/classes --output-dir target/relocated \
//!     --version-tag qwerty
//!
//! # Derive the tag from the class contents and keep a JSON report
//! class-relocator relocate --config relocator.json --tag-from-content --report report.json
//!
//! # Show what a class file declares and references
//! class-relocator inspect target/relocated/qwerty/org/example/A.class --json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod relocator_cli;

use relocator_cli::{inspect::InspectCmd, output, relocate::RelocateCmd};

#[derive(Parser)]
#[command(
    name = "class-relocator",
    author,
    version,
    about = "Relocate version-marked JVM classes",
    long_about = "Moves classes carrying a marker annotation to version-qualified names \
                  and rewrites every symbolic reference to them.\n\n\
                  Only classes that change are written to the output directory."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (list every written class)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Relocate marked classes and propagate the new names
    Relocate(RelocateCmd),

    /// Print the header and referenced classes of one class file
    Inspect(InspectCmd),
}

fn main() {
    let Cli {
        command,
        json,
        verbose,
    } = Cli::parse();

    let result: Result<()> = match command {
        Commands::Relocate(cmd) => cmd.execute(json, verbose),
        Commands::Inspect(cmd) => cmd.execute(json),
    };

    if let Err(err) = result {
        eprintln!("{}", output::format_error(&err, json));
        std::process::exit(1);
    }
}
