//! Version-qualified class relocation.
//!
//! When several builds of one library must share a classpath, classes
//! annotated with a marker (by default `@org.eolang.Versionized`) are moved to
//! `<tag>/<internal name>` and every symbolic reference to them is rewritten.
//! Classes that neither carry the marker nor reference a marked class are not
//! emitted.
//!
//! - [`phases`]: discovery, propagation and fixup
//! - [`store`]: the [`ClassStore`] seam with directory and in-memory stores
//! - [`table`]: the [`RelocationTable`] built by discovery
//! - [`driver`]: [`Relocator`] and [`relocate`], running all phases
//!
//! Class-file parsing and name substitution live in `jvm-classfile`.

pub mod driver;
pub mod error;
pub mod naming;
pub mod phases;
pub mod report;
pub mod store;
pub mod table;
pub mod version_tag;

pub use driver::{relocate, Relocator, DEFAULT_MARKER_DESCRIPTOR};
pub use error::{RelocationError, Result};
pub use phases::Phase;
pub use report::{PhaseReport, RelocationReport};
pub use store::{ClassStore, DirStore, MemoryStore};
pub use table::RelocationTable;
pub use version_tag::{derive_version_tag, validate_marker_descriptor, validate_version_tag};
