//! `.agmd/` module directory rebuilds

use agmd_fs::{AgmdPath, NormalizedPath, io};

use crate::fetch::FileTree;
use crate::{Error, Result};

/// Module files for one source, stored under `.agmd/<dir_name>/`.
#[derive(Debug, Clone)]
pub(crate) struct ModuleFiles {
    pub dir_name: String,
    pub files: FileTree,
}

/// Result of a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ModulesOutcome {
    /// There was nothing to write and nothing to remove
    Untouched,
    /// The previous `.agmd/` was removed
    Removed,
    /// `.agmd/` was rebuilt with this many files
    Rebuilt(usize),
}

/// Rebuild `<entry_dir>/.agmd` so it holds exactly `modules`.
///
/// The new tree is written to a staging directory and swapped in, so a
/// failure part-way leaves the previous `.agmd/` in place. Scratch
/// directories left by an interrupted earlier rebuild are removed first.
pub(crate) fn rebuild_modules(
    entry_dir: &NormalizedPath,
    modules: &[ModuleFiles],
) -> Result<ModulesOutcome> {
    let target = entry_dir.join(AgmdPath::ModulesDir.as_str());
    io::sweep_scratch(&target)?;

    if modules.is_empty() {
        return Ok(if io::remove_path(&target)? {
            tracing::info!(path = %target, "Removed module directory");
            ModulesOutcome::Removed
        } else {
            ModulesOutcome::Untouched
        });
    }

    let staging = io::staging_dir_for(&target)?;
    match populate(&staging, modules) {
        Ok(count) => {
            io::replace_dir(&staging, &target)?;
            tracing::info!(path = %target, files = count, "Rebuilt module directory");
            Ok(ModulesOutcome::Rebuilt(count))
        }
        Err(e) => {
            if let Err(cleanup) = io::remove_path(&staging) {
                tracing::warn!(
                    path = %staging,
                    error = %cleanup,
                    "Failed to remove staging directory"
                );
            }
            Err(e)
        }
    }
}

fn populate(staging: &NormalizedPath, modules: &[ModuleFiles]) -> Result<usize> {
    let mut count = 0;
    for module in modules {
        let module_root = staging.join(&module.dir_name);
        for (relative, content) in &module.files {
            let destination = module_root.join(relative);
            if destination.strip_root(&module_root).is_none_or(|rel| rel == ".") {
                return Err(Error::PathOutsideProject {
                    path: relative.clone(),
                    root: module_root.to_native(),
                });
            }
            io::write_atomic(&destination, content)?;
            count += 1;
        }
    }
    Ok(count)
}
