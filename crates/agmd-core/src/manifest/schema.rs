//! Strict schema check for manifest YAML
//!
//! The manifest is parsed into a `serde_yaml::Value` first and then walked
//! field by field, so a malformed file is reported with a pointer such as
//! `[1].mds[0].module` instead of a generic deserialization error.

use std::collections::HashSet;

use agmd_fs::NormalizedPath;
use serde_yaml::{Mapping, Value};

use super::{ManifestEntry, SourceRef, entry_key};

const ENTRY_FIELDS: [&str; 2] = ["path", "mds"];
const SOURCE_FIELDS: [&str; 3] = ["name", "module", "ref"];

/// A schema violation: where it is and what is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SchemaError {
    pub pointer: String,
    pub message: String,
}

impl SchemaError {
    fn new(pointer: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            message: message.into(),
        }
    }
}

type SchemaResult<T> = std::result::Result<T, SchemaError>;

/// Validate a parsed manifest document and build its entries.
pub(crate) fn validate(document: &Value) -> SchemaResult<Vec<ManifestEntry>> {
    let items = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(items) => items,
        other => {
            return Err(SchemaError::new(
                "$",
                format!("expected a top-level list, found {}", describe(other)),
            ));
        }
    };

    let mut seen_paths = HashSet::new();
    let mut entries = Vec::with_capacity(items.len());

    for (index, item) in items.iter().enumerate() {
        let pointer = format!("[{}]", index);
        let entry = validate_entry(item, &pointer)?;
        if !seen_paths.insert(entry.path.clone()) {
            return Err(SchemaError::new(
                format!("{}.path", pointer),
                format!("duplicate path '{}'", entry.path),
            ));
        }
        entries.push(entry);
    }

    Ok(entries)
}

fn validate_entry(item: &Value, pointer: &str) -> SchemaResult<ManifestEntry> {
    let map = item.as_mapping().ok_or_else(|| {
        SchemaError::new(
            pointer,
            format!(
                "expected a mapping with `path` and `mds`, found {}",
                describe(item)
            ),
        )
    })?;
    reject_unknown_fields(map, &ENTRY_FIELDS, pointer)?;

    let path = match map.get("path") {
        Some(Value::String(path)) if NormalizedPath::new(path.trim()).is_absolute() => {
            return Err(SchemaError::new(
                format!("{}.path", pointer),
                format!("expected a path relative to the project root, found '{}'", path),
            ));
        }
        Some(Value::String(path)) if !path.trim().is_empty() => entry_key(path),
        other => {
            return Err(SchemaError::new(
                format!("{}.path", pointer),
                format!("expected a non-empty string, found {}", describe_opt(other)),
            ));
        }
    };

    let sources = match map.get("mds") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(mds)) => {
            let mut names = HashSet::new();
            let mut sources = Vec::with_capacity(mds.len());
            for (index, md) in mds.iter().enumerate() {
                let md_pointer = format!("{}.mds[{}]", pointer, index);
                let source = validate_source(md, &md_pointer)?;
                if !names.insert(source.name.clone()) {
                    return Err(SchemaError::new(
                        format!("{}.name", md_pointer),
                        format!("duplicate source '{}' for path '{}'", source.name, path),
                    ));
                }
                sources.push(source);
            }
            sources
        }
        Some(other) => {
            return Err(SchemaError::new(
                format!("{}.mds", pointer),
                format!("expected a list, found {}", describe(other)),
            ));
        }
    };

    Ok(ManifestEntry { path, sources })
}

fn validate_source(md: &Value, pointer: &str) -> SchemaResult<SourceRef> {
    let map = md.as_mapping().ok_or_else(|| {
        SchemaError::new(
            pointer,
            format!(
                "expected a mapping with `name` and `module`, found {}",
                describe(md)
            ),
        )
    })?;
    reject_unknown_fields(map, &SOURCE_FIELDS, pointer)?;

    let name = match map.get("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        other => {
            return Err(SchemaError::new(
                format!("{}.name", pointer),
                format!("expected a non-empty string, found {}", describe_opt(other)),
            ));
        }
    };

    let module = match map.get("module") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(module)) => *module,
        Some(other) => {
            return Err(SchemaError::new(
                format!("{}.module", pointer),
                format!("expected a boolean, found {}", describe(other)),
            ));
        }
    };

    let reference = match map.get("ref") {
        None | Some(Value::Null) => None,
        Some(Value::String(reference)) if !reference.trim().is_empty() => {
            Some(reference.trim().to_string())
        }
        Some(other) => {
            return Err(SchemaError::new(
                format!("{}.ref", pointer),
                format!("expected a non-empty string, found {}", describe(other)),
            ));
        }
    };

    Ok(SourceRef {
        name,
        module,
        reference,
    })
}

fn reject_unknown_fields(map: &Mapping, allowed: &[&str], pointer: &str) -> SchemaResult<()> {
    for key in map.keys() {
        match key.as_str() {
            Some(field) if allowed.contains(&field) => {}
            Some(field) => {
                return Err(SchemaError::new(
                    format!("{}.{}", pointer, field),
                    format!("unknown field, expected one of: {}", allowed.join(", ")),
                ));
            }
            None => {
                return Err(SchemaError::new(
                    pointer,
                    format!("field names must be strings, found {}", describe(key)),
                ));
            }
        }
    }
    Ok(())
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => format!("string {:?}", s),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(tagged) => format!("tagged value {}", tagged.tag),
    }
}

fn describe_opt(value: Option<&Value>) -> String {
    value.map_or_else(|| "nothing".to_string(), describe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(yaml: &str) -> SchemaResult<Vec<ManifestEntry>> {
        validate(&serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn empty_document_is_empty_manifest() {
        assert_eq!(parse("").unwrap(), Vec::new());
        assert_eq!(parse("[]").unwrap(), Vec::new());
    }

    #[test]
    fn defaults_for_optional_fields() {
        let entries = parse("- path: ./docs/\n- path: .\n  mds:\n  - name: owner/repo\n").unwrap();

        assert_eq!(entries[0].path, "docs");
        assert!(entries[0].sources.is_empty());
        assert_eq!(entries[1].sources[0], SourceRef::new("owner/repo"));
    }

    #[rstest]
    #[case("path: .", "$")]
    #[case("- just-a-string", "[0]")]
    #[case("- path: ''", "[0].path")]
    #[case("- mds: []", "[0].path")]
    #[case("- path: .\n- path: /etc", "[1].path")]
    #[case("- path: .\n  mds: owner/repo", "[0].mds")]
    #[case("- path: .\n  mds:\n  - owner/repo", "[0].mds[0]")]
    #[case("- path: .\n  mds:\n  - name: 3", "[0].mds[0].name")]
    #[case("- path: .\n- path: a\n  mds:\n  - name: o/r\n    module: 'yes'", "[1].mds[0].module")]
    #[case("- path: .\n  mds:\n  - name: o/r\n    ref: 7", "[0].mds[0].ref")]
    #[case("- path: .\n  tools: []", "[0].tools")]
    #[case("- path: .\n- path: ./", "[1].path")]
    #[case("- path: .\n  mds:\n  - name: o/r\n  - name: o/r", "[0].mds[1].name")]
    fn reports_offending_field(#[case] yaml: &str, #[case] pointer: &str) {
        let err = parse(yaml).unwrap_err();
        assert_eq!(err.pointer, pointer, "message was: {}", err.message);
    }
}
