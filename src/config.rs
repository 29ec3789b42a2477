//! Run configuration.
//!
//! Parameters come from an optional JSON file and from command-line flags;
//! a flag always overrides the file. Example file:
//!
//! ```json
//! {
//!   "input_dir": "target/classes",
//!   "output_dir": "target/relocated",
//!   "version_tag": "v2",
//!   "marker_descriptor": "Lorg/eolang/Versionized;"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use class_relocation::{
    derive_version_tag, validate_marker_descriptor, validate_version_tag, ClassStore,
    DEFAULT_MARKER_DESCRIPTOR,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Partially specified parameters, as read from a file or collected from flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelocatorConfig {
    #[serde(default)]
    pub input_dir: Option<PathBuf>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub version_tag: Option<String>,
    #[serde(default)]
    pub marker_descriptor: Option<String>,
}

impl RelocatorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut config: RelocatorConfig =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;

        // relative directories in the file are relative to the file itself
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.input_dir = config.input_dir.map(|p| base.join(p));
        config.output_dir = config.output_dir.map(|p| base.join(p));
        debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Fields set in `overrides` replace the ones in `self`.
    pub fn merge(self, overrides: RelocatorConfig) -> Self {
        Self {
            input_dir: overrides.input_dir.or(self.input_dir),
            output_dir: overrides.output_dir.or(self.output_dir),
            version_tag: overrides.version_tag.or(self.version_tag),
            marker_descriptor: overrides.marker_descriptor.or(self.marker_descriptor),
        }
    }

    /// Check that every required parameter is present and well formed.
    ///
    /// With `tag_from_content` any configured tag is ignored and the tag is
    /// derived from the input classes at run time.
    pub fn resolve(self, tag_from_content: bool) -> Result<RunConfig> {
        let input_dir = self
            .input_dir
            .ok_or_else(|| anyhow!("missing input directory (--input-dir or \"input_dir\")"))?;
        let output_dir = self
            .output_dir
            .ok_or_else(|| anyhow!("missing output directory (--output-dir or \"output_dir\")"))?;

        let version_tag = if tag_from_content {
            TagSource::FromContent
        } else {
            let tag = self.version_tag.ok_or_else(|| {
                anyhow!("missing version tag (--version-tag, --tag-from-content or \"version_tag\")")
            })?;
            validate_version_tag(&tag)?;
            TagSource::Explicit(tag)
        };

        let marker_descriptor = self
            .marker_descriptor
            .unwrap_or_else(|| DEFAULT_MARKER_DESCRIPTOR.to_string());
        validate_marker_descriptor(&marker_descriptor)?;

        Ok(RunConfig {
            input_dir,
            output_dir,
            version_tag,
            marker_descriptor,
        })
    }
}

/// Where the version tag comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSource {
    Explicit(String),
    /// Hash of the input classes
    FromContent,
}

impl TagSource {
    pub fn resolve<S: ClassStore + ?Sized>(&self, input: &S) -> Result<String> {
        match self {
            TagSource::Explicit(tag) => Ok(tag.clone()),
            TagSource::FromContent => {
                derive_version_tag(input).context("derive version tag from input classes")
            }
        }
    }
}

/// Fully resolved parameters of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub version_tag: TagSource,
    pub marker_descriptor: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use class_relocation::MemoryStore;
    use tempfile::TempDir;

    fn flags(tag: Option<&str>) -> RelocatorConfig {
        RelocatorConfig {
            input_dir: Some(PathBuf::from("in")),
            output_dir: Some(PathBuf::from("out")),
            version_tag: tag.map(str::to_string),
            marker_descriptor: None,
        }
    }

    #[test]
    fn test_load_resolves_paths_against_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relocator.json");
        fs::write(
            &path,
            r#"{ "input_dir": "classes", "output_dir": "/abs/out", "version_tag": "v2" }"#,
        )
        .unwrap();

        let config = RelocatorConfig::load(&path).unwrap();
        assert_eq!(config.input_dir, Some(dir.path().join("classes")));
        assert_eq!(config.output_dir, Some(PathBuf::from("/abs/out")));
        assert_eq!(config.version_tag.as_deref(), Some("v2"));
        assert_eq!(config.marker_descriptor, None);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{ "hash": "abc" }"#).unwrap();
        let err = RelocatorConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parse"));
    }

    #[test]
    fn test_flags_override_file() {
        let file = RelocatorConfig {
            input_dir: Some(PathBuf::from("file-in")),
            output_dir: Some(PathBuf::from("file-out")),
            version_tag: Some("file".to_string()),
            marker_descriptor: Some("LFile;".to_string()),
        };
        let overrides = RelocatorConfig {
            version_tag: Some("flag".to_string()),
            ..Default::default()
        };
        let merged = file.merge(overrides);
        assert_eq!(merged.input_dir, Some(PathBuf::from("file-in")));
        assert_eq!(merged.version_tag.as_deref(), Some("flag"));
        assert_eq!(merged.marker_descriptor.as_deref(), Some("LFile;"));
    }

    #[test]
    fn test_resolve_defaults_marker() {
        let run = flags(Some("v1")).resolve(false).unwrap();
        assert_eq!(run.version_tag, TagSource::Explicit("v1".to_string()));
        assert_eq!(run.marker_descriptor, DEFAULT_MARKER_DESCRIPTOR);
    }

    #[test]
    fn test_resolve_requires_tag_unless_derived() {
        let err = flags(None).resolve(false).unwrap_err();
        assert!(err.to_string().contains("missing version tag"));

        let run = flags(None).resolve(true).unwrap();
        assert_eq!(run.version_tag, TagSource::FromContent);
    }

    #[test]
    fn test_resolve_rejects_bad_tag() {
        let err = flags(Some("a/b")).resolve(false).unwrap_err();
        assert!(err.to_string().contains("version_tag"));
    }

    #[test]
    fn test_tag_from_content() {
        let mut store = MemoryStore::new();
        store.insert("p/A.class", vec![1, 2]);
        let tag = TagSource::FromContent.resolve(&store).unwrap();
        assert!(tag.starts_with('v'));
        assert_eq!(TagSource::FromContent.resolve(&store).unwrap(), tag);
    }
}
