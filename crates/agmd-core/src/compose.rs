//! Composition of `AGENTS.md`
//!
//! A composed document is the optional preamble, then one delimited section
//! per fetched fragment in manifest order, then the local marker followed by
//! the local override verbatim:
//!
//! ```text
//! <preamble>
//!
//! # agmd start owner/repo
//!
//! <fragment>
//!
//! # agmd local
//!
//! <AGENTS.local.md>
//! ```

/// Delimiter opening a fetched fragment; followed by the source name.
pub const START_MARKER: &str = "# agmd start";

/// Delimiter opening the local override section.
pub const LOCAL_MARKER: &str = "# agmd local";

/// Preamble written at the top of the project root's `AGENTS.md`.
pub const ROOT_PREAMBLE: &str = "\
This project's AGENTS.md files are generated by agmd from remote sources \
listed in agmd.yml and from each directory's AGENTS.local.md.
Each remote source is delimited by a `# agmd start <name>` line. Files \
referenced by a module source are stored relative to its AGENTS.md at \
.agmd/<name>, with separators in <name> replaced by `_`.
Edit AGENTS.local.md, not AGENTS.md: AGENTS.md is rewritten on every sync.";

/// One fetched source, ready to be composed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: String,
    pub content: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Decode fetched bytes, replacing invalid UTF-8.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(name, String::from_utf8_lossy(bytes))
    }
}

/// Compose a document. Pure and deterministic.
pub fn compose(preamble: Option<&str>, fragments: &[Fragment], local: Option<&str>) -> String {
    let mut out = String::new();

    if let Some(preamble) = preamble.map(str::trim_end).filter(|p| !p.is_empty()) {
        out.push_str(preamble);
        out.push_str("\n\n");
    }

    for fragment in fragments {
        out.push_str(START_MARKER);
        out.push(' ');
        out.push_str(&fragment.name);
        out.push_str("\n\n");

        let content = fragment.content.trim_end_matches(['\n', '\r']);
        if !content.is_empty() {
            out.push_str(content);
            out.push_str("\n\n");
        }
    }

    out.push_str(LOCAL_MARKER);
    out.push('\n');

    if let Some(local) = local.filter(|l| !l.trim().is_empty()) {
        out.push('\n');
        out.push_str(local);
    }

    out
}

/// Whether `text` looks like output of [`compose`].
pub fn is_composed_document(text: &str) -> bool {
    text.lines().any(|line| line.trim_end() == LOCAL_MARKER)
}
