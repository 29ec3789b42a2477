//! Validation of run parameters and content-derived version tags.

use sha2::{Digest, Sha256};

use crate::error::{RelocationError, Result};
use crate::phases::Phase;
use crate::store::ClassStore;

/// Hex digits of the content digest kept in a derived tag.
pub const DERIVED_TAG_HEX_LEN: usize = 16;

/// Check that `tag` can be used verbatim as one internal-name segment.
pub fn validate_version_tag(tag: &str) -> Result<()> {
    let reason = if tag.is_empty() {
        Some("must not be empty".to_string())
    } else if tag == "." || tag == ".." {
        Some(format!("{tag:?} is not a usable path segment"))
    } else {
        tag.chars()
            .find(|c| matches!(c, '/' | '\\' | '.' | ';' | '[') || c.is_control())
            .map(|c| format!("{c:?} is not allowed in a version tag"))
    };

    match reason {
        Some(reason) => Err(RelocationError::InvalidConfig {
            field: "version_tag",
            reason,
        }),
        None => Ok(()),
    }
}

/// Check that `descriptor` is an object type descriptor such as `Lorg/eolang/Versionized;`.
pub fn validate_marker_descriptor(descriptor: &str) -> Result<()> {
    let invalid = |reason: &str| RelocationError::InvalidConfig {
        field: "marker_descriptor",
        reason: format!("{descriptor:?} {reason}"),
    };

    let Some(name) = descriptor
        .strip_prefix('L')
        .and_then(|rest| rest.strip_suffix(';'))
    else {
        return Err(invalid("must have the form L<internal name>;"));
    };
    if name.is_empty() || name.starts_with('/') || name.ends_with('/') || name.contains("//") {
        return Err(invalid("does not hold a valid internal name"));
    }
    if name.contains(['.', ';', '[', '<', '>']) {
        return Err(invalid("contains characters not allowed in an internal name"));
    }
    Ok(())
}

/// Derive a tag from the content of every class in `store`.
///
/// The tag is `v` followed by the first hex digits of a SHA-256 over each
/// sorted path and its bytes, so identical inputs always relocate to the same
/// names.
pub fn derive_version_tag<S: ClassStore + ?Sized>(store: &S) -> Result<String> {
    let paths = store
        .list_classes()
        .map_err(|e| RelocationError::storage(Phase::Discovery, ".", e))?;

    let mut hasher = Sha256::new();
    for path in &paths {
        let bytes = store
            .read(path)
            .map_err(|e| RelocationError::storage(Phase::Discovery, path, e))?;
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
        hasher.update((bytes.len() as u64).to_be_bytes());
        hasher.update(&bytes);
    }
    let digest = hex::encode(hasher.finalize());
    Ok(format!("v{}", &digest[..DERIVED_TAG_HEX_LEN]))
}
