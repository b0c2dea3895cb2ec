//! Conversion between YAML text and the [`Section`] tree.
//!
//! On-disk layout:
//! ```text
//! # optional header, one comment line per header line
//! #
//! # (blank line separates the header from the body)
//!
//! npc:
//!   '0':
//!     name: Bob
//!     speed: '1.5'
//! ```
//!
//! `null` scalars are dropped on read, tags are unwrapped, and non-string
//! mapping keys are converted to their text form. A mapping that repeats a
//! key is rejected as a [`StorageError::Serialization`] rather than resolved
//! to either value.

use std::path::Path;

use cairn_key::{Section, StorageError, StorageResult, Value};
use serde_yaml::{Mapping, Value as Yaml};
use tracing::warn;

/// A parsed document: its leading comment header and its body.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct Parsed {
    pub header: Option<String>,
    pub root: Section,
}

/// Parse document text read from `source`.
pub(crate) fn parse(source: &Path, text: &str) -> StorageResult<Parsed> {
    let header = parse_header(text);
    if text.lines().all(is_blank_or_comment) {
        return Ok(Parsed {
            header,
            root: Section::new(),
        });
    }

    let document: Yaml =
        serde_yaml::from_str(text).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let root = match document {
        Yaml::Mapping(mapping) => section_from_mapping(mapping),
        Yaml::Null => Section::new(),
        Yaml::Tagged(tagged) => match tagged.value {
            Yaml::Mapping(mapping) => section_from_mapping(mapping),
            _ => {
                return Err(StorageError::NotAMapping {
                    path: source.to_path_buf(),
                })
            }
        },
        _ => {
            return Err(StorageError::NotAMapping {
                path: source.to_path_buf(),
            })
        }
    };
    Ok(Parsed { header, root })
}

/// Render a header and body to document text.
pub(crate) fn render(header: Option<&str>, root: &Section) -> StorageResult<String> {
    let mut out = String::new();
    if let Some(header) = header.filter(|h| !h.is_empty()) {
        for line in header.lines() {
            if line.is_empty() {
                out.push_str("#\n");
            } else {
                out.push_str("# ");
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');
    }
    if !root.is_empty() {
        let body = serde_yaml::to_string(&Yaml::Mapping(mapping_from_section(root)))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        out.push_str(&body);
    }
    Ok(out)
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn parse_header(text: &str) -> Option<String> {
    let lines: Vec<&str> = text
        .lines()
        .take_while(|line| line.starts_with('#'))
        .map(|line| {
            let body = &line[1..];
            body.strip_prefix(' ').unwrap_or(body)
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn section_from_mapping(mapping: Mapping) -> Section {
    let mut section = Section::new();
    for (key, value) in mapping {
        let Some(name) = key_text(&key) else {
            warn!(?key, "skipping mapping entry with unsupported key");
            continue;
        };
        if let Some(value) = value_from_yaml(value) {
            section.insert(name, value);
        }
    }
    section
}

fn key_text(key: &Yaml) -> Option<String> {
    match key {
        Yaml::String(s) => Some(s.clone()),
        Yaml::Bool(b) => Some(b.to_string()),
        Yaml::Number(n) => Some(n.to_string()),
        Yaml::Tagged(tagged) => key_text(&tagged.value),
        _ => None,
    }
}

fn value_from_yaml(value: Yaml) -> Option<Value> {
    match value {
        Yaml::Null => None,
        Yaml::Bool(b) => Some(Value::Bool(b)),
        Yaml::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Int(i)),
            None => n.as_f64().map(Value::Float),
        },
        Yaml::String(s) => Some(Value::String(s)),
        Yaml::Sequence(items) => Some(Value::List(
            items.into_iter().filter_map(value_from_yaml).collect(),
        )),
        Yaml::Mapping(mapping) => Some(Value::Section(section_from_mapping(mapping))),
        Yaml::Tagged(tagged) => value_from_yaml(tagged.value),
    }
}

fn mapping_from_section(section: &Section) -> Mapping {
    section
        .iter()
        .map(|(name, value)| (Yaml::String(name.clone()), value_to_yaml(value)))
        .collect()
}

fn value_to_yaml(value: &Value) -> Yaml {
    match value {
        Value::Bool(b) => Yaml::Bool(*b),
        Value::Int(i) => Yaml::Number((*i).into()),
        Value::Float(x) => Yaml::Number((*x).into()),
        Value::String(s) => Yaml::String(s.clone()),
        Value::List(items) => Yaml::Sequence(items.iter().map(value_to_yaml).collect()),
        Value::Section(section) => Yaml::Mapping(mapping_from_section(section)),
    }
}
