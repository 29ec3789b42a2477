//! Mapping between storage paths and internal class names.
//!
//! Internal names always use `/`; a storage path is the internal name plus
//! `.class`. Backslashes coming from a host path are normalized on the way in.

pub const CLASS_EXTENSION: &str = ".class";

/// Internal name for a relative class path, or `None` if it is not a `.class` file.
pub fn internal_name_from_path(path: &str) -> Option<String> {
    let normalized = path.replace('\\', "/");
    let stem = normalized.strip_suffix(CLASS_EXTENSION)?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(stem.to_string())
}

/// Relative storage path for an internal name.
pub fn class_path(internal_name: &str) -> String {
    format!("{internal_name}{CLASS_EXTENSION}")
}

/// `<tag>/<name>`
pub fn relocated_name(version_tag: &str, internal_name: &str) -> String {
    format!("{version_tag}/{internal_name}")
}
