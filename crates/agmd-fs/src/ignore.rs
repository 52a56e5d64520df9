//! Ignore-list editing
//!
//! Appends missing rules to a `.gitignore`-style file. Existing lines are
//! never reordered or rewritten.

use crate::{NormalizedPath, Result, io};

/// Ensure every rule in `rules` appears as a line of the file at `path`.
///
/// Creates the file if needed. Returns the rules that were appended, in order.
pub fn ensure_rules(path: &NormalizedPath, rules: &[&str]) -> Result<Vec<String>> {
    let existing = io::read_text_if_exists(path)?.unwrap_or_default();
    let present: Vec<&str> = existing.lines().map(str::trim_end).collect();

    let missing: Vec<String> = rules
        .iter()
        .filter(|rule| !present.contains(rule))
        .map(|rule| rule.to_string())
        .collect();

    if missing.is_empty() {
        return Ok(missing);
    }

    let mut content = existing;
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    for rule in &missing {
        content.push_str(rule);
        content.push('\n');
    }

    io::write_text(path, &content)?;
    tracing::debug!(path = %path, added = ?missing, "Updated ignore list");
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn creates_file_with_rules() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path().join(".gitignore"));

        let added = ensure_rules(&path, &["AGENTS.md", "**/.agmd/"]).unwrap();

        assert_eq!(added, vec!["AGENTS.md", "**/.agmd/"]);
        assert_eq!(io::read_text(&path).unwrap(), "AGENTS.md\n**/.agmd/\n");
    }

    #[test]
    fn keeps_existing_lines_and_adds_missing_newline() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path().join(".gitignore"));
        std::fs::write(path.to_native(), "target/\nAGENTS.md").unwrap();

        let added = ensure_rules(&path, &["AGENTS.md", "**/.agmd/"]).unwrap();

        assert_eq!(added, vec!["**/.agmd/"]);
        assert_eq!(
            io::read_text(&path).unwrap(),
            "target/\nAGENTS.md\n**/.agmd/\n"
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path().join(".gitignore"));

        ensure_rules(&path, &["AGENTS.md"]).unwrap();
        let added = ensure_rules(&path, &["AGENTS.md"]).unwrap();

        assert!(added.is_empty());
        assert_eq!(io::read_text(&path).unwrap(), "AGENTS.md\n");
    }
}
