//! Project bootstrapping
//!
//! `initialize` is safe to re-run: an existing manifest is never rewritten,
//! ignore rules are only appended when missing, and the shared-file migration
//! only touches hand-written `AGENTS.md` files.

use std::fs;

use agmd_fs::constants::IGNORE_RULES;
use agmd_fs::{AgmdPath, NormalizedPath, ignore};

use crate::compose::is_composed_document;
use crate::manifest::{Manifest, SourceRef};
use crate::project::normalize_entry_path;
use crate::{Error, Result};

/// Inputs to [`initialize`].
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// `PATH=SOURCE` pairs seeding a newly created manifest
    pub mappings: Vec<String>,
}

/// A shared `AGENTS.md` moved to `AGENTS.local.md`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub from: NormalizedPath,
    pub to: NormalizedPath,
}

/// What [`initialize`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub manifest: NormalizedPath,
    pub manifest_created: bool,
    /// Mappings were given but the manifest already existed
    pub mappings_ignored: bool,
    pub ignore_file: NormalizedPath,
    pub ignore_rules_added: Vec<String>,
    pub renamed: Vec<Migration>,
}

/// Parse one `PATH=SOURCE` mapping into a manifest key and source.
///
/// # Errors
///
/// `Error::InvalidMapping` for a missing `=` or an empty side,
/// `Error::PathOutsideProject` for a path outside `root`.
pub fn parse_mapping(raw: &str, root: &NormalizedPath) -> Result<(String, SourceRef)> {
    let invalid = |reason: &str| Error::InvalidMapping {
        mapping: raw.to_string(),
        reason: reason.to_string(),
    };

    let (path, source) = raw
        .split_once('=')
        .ok_or_else(|| invalid("expected PATH=SOURCE"))?;
    let (path, source) = (path.trim(), source.trim());
    if path.is_empty() {
        return Err(invalid("path cannot be empty"));
    }
    if source.is_empty() {
        return Err(invalid("source cannot be empty"));
    }

    Ok((normalize_entry_path(path, root)?, SourceRef::new(source)))
}

/// Bootstrap agmd in the project at `root`.
///
/// Everything that can fail validation (mappings, migration conflicts) is
/// checked before anything is written.
///
/// # Errors
///
/// Mapping errors as in [`parse_mapping`], `Error::InvalidSourceRef` for a
/// mapped source that does not parse, and `Error::OverrideAlreadyExists`
/// when a shared file cannot be migrated.
pub fn initialize(root: &NormalizedPath, options: &InitOptions) -> Result<InitReport> {
    let mut seeded = Manifest::new();
    for raw in &options.mappings {
        let (path, source) = parse_mapping(raw, root)?;
        seeded.add_source(&path, source)?;
    }

    let migrations = plan_migrations(root)?;

    let manifest_path = root.join(AgmdPath::Manifest.as_str());
    let manifest_created = !manifest_path.exists();
    if manifest_created {
        seeded.save(&manifest_path)?;
        tracing::info!(path = %manifest_path, entries = seeded.entries().len(), "Created manifest");
    } else {
        tracing::debug!(path = %manifest_path, "Manifest already exists");
    }

    let ignore_file = root.join(AgmdPath::GitIgnore.as_str());
    let ignore_rules_added = ignore::ensure_rules(&ignore_file, &IGNORE_RULES)?;

    for migration in &migrations {
        fs::rename(migration.from.to_native(), migration.to.to_native())
            .map_err(|e| agmd_fs::Error::io(migration.from.to_native(), e))?;
        tracing::info!(from = %migration.from, to = %migration.to, "Migrated shared file");
    }

    Ok(InitReport {
        manifest: manifest_path,
        manifest_created,
        mappings_ignored: !manifest_created && !options.mappings.is_empty(),
        ignore_file,
        ignore_rules_added,
        renamed: migrations,
    })
}

/// Find every hand-written `AGENTS.md` under `root` that should become
/// `AGENTS.local.md`.
///
/// `.git` and `.agmd` directories are skipped, symlinks are not followed,
/// and files produced by agmd are left alone.
///
/// # Errors
///
/// Returns `Error::OverrideAlreadyExists` for the first candidate whose
/// directory already has an `AGENTS.local.md`.
pub fn plan_migrations(root: &NormalizedPath) -> Result<Vec<Migration>> {
    let mut migrations = Vec::new();
    let mut pending = vec![root.clone()];

    while let Some(dir) = pending.pop() {
        let mut children: Vec<_> = fs::read_dir(dir.to_native())
            .map_err(|e| agmd_fs::Error::io(dir.to_native(), e))?
            .collect::<std::io::Result<_>>()
            .map_err(|e| agmd_fs::Error::io(dir.to_native(), e))?;
        children.sort_by_key(|entry| entry.file_name());

        for child in children {
            let name = child.file_name().to_string_lossy().into_owned();
            let file_type = child
                .file_type()
                .map_err(|e| agmd_fs::Error::io(child.path(), e))?;
            let path = dir.join(&name);

            if file_type.is_dir() {
                if name != AgmdPath::GitDir.as_str() && name != AgmdPath::ModulesDir.as_str() {
                    pending.push(path);
                }
                continue;
            }
            if !file_type.is_file() || name != AgmdPath::Composed.as_str() {
                continue;
            }

            let content = fs::read(path.to_native())
                .map_err(|e| agmd_fs::Error::io(path.to_native(), e))?;
            if is_composed_document(&String::from_utf8_lossy(&content)) {
                tracing::debug!(path = %path, "Skipping generated file");
                continue;
            }

            let local = dir.join(AgmdPath::LocalOverride.as_str());
            if local.exists() {
                return Err(Error::OverrideAlreadyExists {
                    path: local.to_native(),
                    shared: path.to_native(),
                });
            }
            migrations.push(Migration {
                from: path,
                to: local,
            });
        }
    }

    migrations.sort_by(|a, b| a.from.cmp(&b.from));
    Ok(migrations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn parse_mapping_normalizes_path() {
        let root = NormalizedPath::new("/work/project");
        let (path, source) = parse_mapping(" ./docs/ = owner/repo ", &root).unwrap();

        assert_eq!(path, "docs");
        assert_eq!(source, SourceRef::new("owner/repo"));
    }

    #[rstest]
    #[case("docs", ErrorKind::InvalidMapping)]
    #[case("=owner/repo", ErrorKind::InvalidMapping)]
    #[case("docs=", ErrorKind::InvalidMapping)]
    #[case("../up=owner/repo", ErrorKind::PathOutsideProject)]
    fn parse_mapping_rejects(#[case] raw: &str, #[case] kind: ErrorKind) {
        let root = NormalizedPath::new("/work/project");
        assert_eq!(parse_mapping(raw, &root).unwrap_err().kind(), kind);
    }

    #[test]
    fn plan_skips_git_modules_and_generated_files() {
        let dir = TempDir::new().unwrap();
        let root = NormalizedPath::new(dir.path());
        for sub in [".git", ".agmd/o_r", "generated", "hand"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        fs::write(dir.path().join(".git/AGENTS.md"), "x").unwrap();
        fs::write(dir.path().join(".agmd/o_r/AGENTS.md"), "x").unwrap();
        fs::write(
            dir.path().join("generated/AGENTS.md"),
            "# agmd start o/r\n\nx\n\n# agmd local\n",
        )
        .unwrap();
        fs::write(dir.path().join("hand/AGENTS.md"), "mine").unwrap();

        let migrations = plan_migrations(&root).unwrap();

        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].from, root.join("hand/AGENTS.md"));
        assert_eq!(migrations[0].to, root.join("hand/AGENTS.local.md"));
    }

    #[test]
    fn invalid_mapping_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let root = NormalizedPath::new(dir.path());

        let options = InitOptions {
            mappings: vec![".=owner/repo".into(), "docs=owner".into()],
        };
        let err = initialize(&root, &options).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidSourceRef);
        assert!(!dir.path().join("agmd.yml").exists());
        assert!(!dir.path().join(".gitignore").exists());
    }
}
