//! Loading and saving `agmd.yml`

use agmd_fs::{NormalizedPath, io};

use super::{Manifest, schema};
use crate::{Error, Result};

impl Manifest {
    /// Load the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ManifestMissing` if the file does not exist and
    /// `Error::ManifestCorrupt` if it is not valid YAML or violates the schema.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        let Some(content) = io::read_text_if_exists(path)? else {
            return Err(Error::ManifestMissing {
                path: path.to_native(),
            });
        };
        let manifest = Self::parse(&content, path)?;
        tracing::debug!(
            path = %path,
            entries = manifest.entries.len(),
            "Loaded manifest"
        );
        Ok(manifest)
    }

    /// Parse manifest text; `path` is only used for error reporting.
    pub fn parse(content: &str, path: &NormalizedPath) -> Result<Self> {
        let document: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| Error::ManifestCorrupt {
                path: path.to_native(),
                pointer: e
                    .location()
                    .map(|l| format!("line {}, column {}", l.line(), l.column()))
                    .unwrap_or_else(|| "$".to_string()),
                message: e.to_string(),
            })?;

        let entries = schema::validate(&document).map_err(|e| Error::ManifestCorrupt {
            path: path.to_native(),
            pointer: e.pointer,
            message: e.message,
        })?;

        Ok(Self { entries })
    }

    /// Serialize to the on-disk YAML form.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.entries)?)
    }

    /// Write the manifest to `path` atomically.
    pub fn save(&self, path: &NormalizedPath) -> Result<()> {
        io::write_text(path, &self.to_yaml()?)?;
        tracing::debug!(path = %path, entries = self.entries.len(), "Saved manifest");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::manifest::SourceRef;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_reports_missing() {
        let dir = TempDir::new().unwrap();
        let path = NormalizedPath::new(dir.path().join("agmd.yml"));

        let err = Manifest::load(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManifestMissing);
    }

    #[test]
    fn malformed_yaml_is_corrupt() {
        let err = Manifest::parse("- path: [unclosed", &NormalizedPath::new("agmd.yml"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManifestCorrupt);
    }

    #[test]
    fn save_then_load_preserves_order_and_refs() {
        let dir = TempDir::new().unwrap();
        let path = NormalizedPath::new(dir.path().join("agmd.yml"));

        let mut manifest = Manifest::new();
        manifest.add_source("docs", SourceRef::new("z/last")).unwrap();
        manifest
            .add_source(
                "docs",
                SourceRef::new("a/first").module(true).reference(Some("v2".into())),
            )
            .unwrap();
        manifest.add_source(".", SourceRef::new("m/root")).unwrap();
        manifest.save(&path).unwrap();

        assert_eq!(Manifest::load(&path).unwrap(), manifest);
    }

    #[test]
    fn saved_form_uses_mds_key_and_omits_absent_ref() {
        let mut manifest = Manifest::new();
        manifest
            .add_source(".", SourceRef::new("owner/repo").module(true))
            .unwrap();

        let yaml = manifest.to_yaml().unwrap();
        assert!(yaml.contains("mds:"), "got: {}", yaml);
        assert!(yaml.contains("module: true"), "got: {}", yaml);
        assert!(!yaml.contains("ref"), "got: {}", yaml);
    }
}
