//! The `agmd.yml` manifest
//!
//! The manifest is an ordered list of tracked paths, each with the ordered
//! list of sources composed into that path's `AGENTS.md`:
//!
//! ```yaml
//! - path: .
//!   mds:
//!   - name: owner/repo
//!     module: false
//!   - name: owner/other/docs
//!     module: true
//!     ref: develop
//! ```
//!
//! Source order is render order.

mod schema;
mod store;

use std::path::PathBuf;

use serde::Serialize;

use agmd_fs::NormalizedPath;

use crate::source::SourceSpec;
use crate::{Error, Result};

/// One remote source tracked for a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    /// `owner/repo[/subpath]` or `owner/repo/tree/<ref>[/subpath]`
    pub name: String,
    /// Whether the files next to the source's `AGENTS.md` are pulled too
    pub module: bool,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SourceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: false,
            reference: None,
        }
    }

    pub fn module(mut self, module: bool) -> Self {
        self.module = module;
        self
    }

    pub fn reference(mut self, reference: Option<String>) -> Self {
        self.reference = reference;
        self
    }

    /// Resolve the name and recorded ref into a fetchable spec.
    pub fn resolve(&self) -> Result<SourceSpec> {
        SourceSpec::parse(&self.name)?.with_reference(self.reference.as_deref())
    }
}

/// A tracked path and its sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    /// Project-relative directory, `.` for the root
    pub path: String,
    #[serde(rename = "mds")]
    pub sources: Vec<SourceRef>,
}

impl ManifestEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sources: Vec::new(),
        }
    }

    pub fn source(&self, name: &str) -> Option<&SourceRef> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// What `add_source` did to the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Updated,
    Unchanged,
}

/// The ordered set of manifest entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn entry(&self, path: &str) -> Option<&ManifestEntry> {
        let key = entry_key(path);
        self.entries.iter().find(|e| e.path == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add or update a source for `path`.
    ///
    /// Idempotent on `(path, name)`: re-adding an existing source updates its
    /// `module` flag and records a newly supplied ref instead of duplicating
    /// it. New paths and new sources are appended, preserving order.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSourceRef` if the name does not parse, or if the
    /// source is already tracked for `path` with a different explicit ref,
    /// and `Error::PathOutsideProject` for an absolute `path`.
    pub fn add_source(&mut self, path: &str, source: SourceRef) -> Result<AddOutcome> {
        let source = SourceRef {
            reference: source
                .reference
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            ..source
        };
        let spec = source.resolve()?;
        let source = SourceRef {
            name: spec.name().to_string(),
            ..source
        };
        let key = entry_key(path);
        if NormalizedPath::new(&key).is_absolute() {
            return Err(Error::PathOutsideProject {
                path: key,
                root: PathBuf::from("."),
            });
        }

        let index = match self.entries.iter().position(|e| e.path == key) {
            Some(index) => index,
            None => {
                self.entries.push(ManifestEntry::new(key));
                self.entries.len() - 1
            }
        };
        let entry = &mut self.entries[index];

        let Some(position) = entry.sources.iter().position(|s| s.name == source.name) else {
            tracing::debug!(path = %entry.path, source = %source.name, "Adding source");
            entry.sources.push(source);
            return Ok(AddOutcome::Added);
        };
        let existing = &mut entry.sources[position];

        if let (Some(current), Some(requested)) = (&existing.reference, &source.reference)
            && current != requested
        {
            return Err(Error::invalid_source(
                &source.name,
                format!(
                    "already tracked for '{}' with ref '{}', not '{}'",
                    entry.path, current, requested
                ),
            ));
        }

        let before = existing.clone();
        existing.module = source.module;
        if source.reference.is_some() {
            existing.reference = source.reference;
        }

        if *existing == before {
            Ok(AddOutcome::Unchanged)
        } else {
            tracing::debug!(path = %entry.path, source = %existing.name, "Updated source");
            Ok(AddOutcome::Updated)
        }
    }
}

/// Normalize a configured path to its manifest key.
fn entry_key(path: &str) -> String {
    NormalizedPath::new(path.trim()).as_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_source_appends_in_order() {
        let mut manifest = Manifest::new();
        manifest.add_source(".", SourceRef::new("a/one")).unwrap();
        manifest.add_source(".", SourceRef::new("b/two")).unwrap();
        manifest.add_source("docs", SourceRef::new("c/three")).unwrap();

        let names: Vec<_> = manifest.entries()[0]
            .sources
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["a/one", "b/two"]);
        assert_eq!(manifest.entries()[1].path, "docs");
    }

    #[test]
    fn add_source_twice_keeps_one_entry_with_latest_flag() {
        let mut manifest = Manifest::new();
        let first = manifest
            .add_source(".", SourceRef::new("owner/repo").module(true))
            .unwrap();
        let second = manifest
            .add_source(".", SourceRef::new("owner/repo").module(false))
            .unwrap();

        assert_eq!(first, AddOutcome::Added);
        assert_eq!(second, AddOutcome::Updated);
        let entry = manifest.entry(".").unwrap();
        assert_eq!(entry.sources.len(), 1);
        assert!(!entry.sources[0].module);
    }

    #[test]
    fn add_source_same_flags_is_unchanged() {
        let mut manifest = Manifest::new();
        manifest.add_source(".", SourceRef::new("owner/repo")).unwrap();
        let outcome = manifest.add_source("./", SourceRef::new("owner/repo/")).unwrap();

        assert_eq!(outcome, AddOutcome::Unchanged);
        assert_eq!(manifest.entries().len(), 1);
    }

    #[test]
    fn add_source_records_new_ref() {
        let mut manifest = Manifest::new();
        manifest.add_source(".", SourceRef::new("owner/repo")).unwrap();
        let outcome = manifest
            .add_source(
                ".",
                SourceRef::new("owner/repo").reference(Some("develop".into())),
            )
            .unwrap();

        assert_eq!(outcome, AddOutcome::Updated);
        assert_eq!(
            manifest.entry(".").unwrap().sources[0].reference.as_deref(),
            Some("develop")
        );
    }

    #[test]
    fn add_source_conflicting_ref_is_invalid() {
        let mut manifest = Manifest::new();
        manifest
            .add_source(".", SourceRef::new("owner/repo").reference(Some("main".into())))
            .unwrap();
        let err = manifest
            .add_source(
                ".",
                SourceRef::new("owner/repo").reference(Some("develop".into())),
            )
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidSourceRef);
        assert_eq!(manifest.entry(".").unwrap().sources.len(), 1);
    }

    #[test]
    fn add_source_rejects_unparseable_name() {
        let mut manifest = Manifest::new();
        let err = manifest.add_source(".", SourceRef::new("owner")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidSourceRef);
        assert!(manifest.is_empty());
    }

    #[test]
    fn add_source_rejects_absolute_path() {
        let mut manifest = Manifest::new();
        let err = manifest
            .add_source("/etc", SourceRef::new("owner/repo"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PathOutsideProject);
        assert!(manifest.is_empty());
    }
}
