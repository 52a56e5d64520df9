//! Remote source resolution
//!
//! Turns user-supplied references such as `owner/repo`, `owner/repo/docs` or
//! `owner/repo/tree/main/docs` into a [`SourceLocation`] the fetcher can act
//! on. Parsing is pure: nothing here touches the network.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{Error, Result};

/// Segment marker introducing an explicit ref, as in GitHub tree URLs.
const TREE_MARKER: &str = "tree";

/// Prefixes accepted in front of `owner/repo`.
const HOST_PREFIXES: [&str; 3] = ["https://github.com/", "http://github.com/", "github.com/"];

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").expect("identifier pattern is valid"));

static UNSAFE_DIR_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("directory pattern is valid"));

/// A concrete fetch target. Doubles as the per-run cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub owner: String,
    pub repo: String,
    /// Branch, tag or commit; `None` means the repository default branch
    pub reference: Option<String>,
    /// Directory inside the repository; `None` means the repository root
    pub subpath: Option<String>,
}

impl SourceLocation {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            reference: None,
            subpath: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = Some(subpath.into());
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(reference) = &self.reference {
            write!(f, "@{}", reference)?;
        }
        if let Some(subpath) = &self.subpath {
            write!(f, ":{}", subpath)?;
        }
        Ok(())
    }
}

/// A parsed source reference: its canonical name plus where to fetch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    name: String,
    location: SourceLocation,
}

impl SourceSpec {
    /// Parse a reference string.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSourceRef` when the reference has fewer than two
    /// segments, contains empty or relative segments, or uses the `tree`
    /// marker without a ref.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let without_host = HOST_PREFIXES
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix))
            .unwrap_or(trimmed);
        let cleaned = without_host.trim_matches('/');

        if cleaned.is_empty() {
            return Err(Error::invalid_source(input, "reference is empty"));
        }

        let parts: Vec<&str> = cleaned.split('/').collect();
        if parts.len() < 2 {
            return Err(Error::invalid_source(
                input,
                "expected at least <owner>/<repo>",
            ));
        }
        if let Some(bad) = parts.iter().find(|p| p.is_empty() || **p == "." || **p == "..") {
            return Err(Error::invalid_source(
                input,
                format!("invalid path segment '{}'", bad),
            ));
        }

        let owner = parts[0];
        let repo = parts[1].strip_suffix(".git").unwrap_or(parts[1]);
        for identifier in [owner, repo] {
            if !IDENTIFIER.is_match(identifier) {
                return Err(Error::invalid_source(
                    input,
                    format!("'{}' is not a valid owner or repository name", identifier),
                ));
            }
        }

        let (reference, rest) = match parts.get(2) {
            Some(&TREE_MARKER) => match parts.get(3) {
                Some(reference) => (Some(reference.to_string()), &parts[4..]),
                None => {
                    return Err(Error::invalid_source(
                        input,
                        "expected a ref after 'tree'",
                    ));
                }
            },
            _ => (None, &parts[2..]),
        };

        let subpath = (!rest.is_empty()).then(|| rest.join("/"));

        Ok(Self {
            name: cleaned.to_string(),
            location: SourceLocation {
                owner: owner.to_string(),
                repo: repo.to_string(),
                reference,
                subpath,
            },
        })
    }

    /// Apply a ref recorded next to the name in the manifest.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidSourceRef` if the name already pins a different
    /// ref via `tree/<ref>`.
    pub fn with_reference(mut self, reference: Option<&str>) -> Result<Self> {
        let Some(reference) = reference.map(str::trim).filter(|r| !r.is_empty()) else {
            return Ok(self);
        };
        match &self.location.reference {
            Some(existing) if existing != reference => Err(Error::invalid_source(
                &self.name,
                format!(
                    "name pins ref '{}' but '{}' was also given",
                    existing, reference
                ),
            )),
            _ => {
                self.location.reference = Some(reference.to_string());
                Ok(self)
            }
        }
    }

    /// Canonical display name; also the delimiter key in composed output.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn into_location(self) -> SourceLocation {
        self.location
    }

    /// Directory name under `.agmd/` for this source's module files.
    pub fn module_dir_name(&self) -> String {
        module_dir_name(&self.name)
    }
}

/// Map a source name to a filesystem-safe directory name.
pub fn module_dir_name(name: &str) -> String {
    UNSAFE_DIR_CHARS
        .replace_all(name.trim().trim_matches('/'), "_")
        .into_owned()
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("owner/repo", "owner", "repo", None, None)]
    #[case("owner/repo/", "owner", "repo", None, None)]
    #[case("owner/repo/docs/agents", "owner", "repo", None, Some("docs/agents"))]
    #[case("owner/repo/tree/main/src", "owner", "repo", Some("main"), Some("src"))]
    #[case("owner/repo/tree/v1.2", "owner", "repo", Some("v1.2"), None)]
    #[case("https://github.com/owner/repo.git", "owner", "repo", None, None)]
    #[case("  github.com/owner/repo/tree/dev/a/b ", "owner", "repo", Some("dev"), Some("a/b"))]
    fn parses_valid_references(
        #[case] input: &str,
        #[case] owner: &str,
        #[case] repo: &str,
        #[case] reference: Option<&str>,
        #[case] subpath: Option<&str>,
    ) {
        let spec = SourceSpec::parse(input).unwrap();
        let location = spec.location();

        assert_eq!(location.owner, owner);
        assert_eq!(location.repo, repo);
        assert_eq!(location.reference.as_deref(), reference);
        assert_eq!(location.subpath.as_deref(), subpath);
    }

    #[rstest]
    #[case("")]
    #[case("owner")]
    #[case("/owner/")]
    #[case("owner//repo")]
    #[case("owner/repo/tree")]
    #[case("owner/repo/../secrets")]
    #[case("own er/repo")]
    fn rejects_invalid_references(#[case] input: &str) {
        let err = SourceSpec::parse(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSourceRef);
    }

    #[test]
    fn name_is_cleaned_input() {
        let spec = SourceSpec::parse(" owner/repo/docs/ ").unwrap();
        assert_eq!(spec.name(), "owner/repo/docs");
    }

    #[test]
    fn manifest_ref_fills_default_branch() {
        let spec = SourceSpec::parse("owner/repo")
            .unwrap()
            .with_reference(Some("develop"))
            .unwrap();
        assert_eq!(spec.location().reference.as_deref(), Some("develop"));
    }

    #[test]
    fn manifest_ref_conflicting_with_tree_ref_is_rejected() {
        let err = SourceSpec::parse("owner/repo/tree/main/docs")
            .unwrap()
            .with_reference(Some("develop"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSourceRef);
    }

    #[test]
    fn module_dir_name_replaces_separators() {
        let spec = SourceSpec::parse("owner/repo/tree/main/docs").unwrap();
        assert_eq!(spec.module_dir_name(), "owner_repo_tree_main_docs");
        assert_eq!(module_dir_name("a/b c/d"), "a_b_c_d");
    }
}
