//! Document tree types: [`Value`] nodes and ordered [`Section`] mappings.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::path::{self, SEPARATOR};

/// A node in the document tree.
///
/// A path resolves to exactly one node: either a scalar, a list, or a nested
/// [`Section`]. Writing to a path replaces whatever was there before.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Section(Section),
}

impl Value {
    /// Returns `true` if this value is a nested section.
    pub fn is_section(&self) -> bool {
        matches!(self, Value::Section(_))
    }

    /// Borrow the nested section, if this value is one.
    pub fn as_section(&self) -> Option<&Section> {
        match self {
            Value::Section(section) => Some(section),
            _ => None,
        }
    }

    /// Borrow the string contents, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value counts as stored data.
    ///
    /// Empty sections are structural leftovers (for example after removing
    /// their last child) and do not count.
    pub fn is_present(&self) -> bool {
        match self {
            Value::Section(section) => !section.is_empty(),
            _ => true,
        }
    }

    /// Short type label used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Section(_) => "section",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Section(section) => write!(f, "{section}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Section> for Value {
    fn from(value: Section) -> Self {
        Value::Section(value)
    }
}

/// An ordered mapping of segment names to [`Value`]s.
///
/// Iteration follows insertion order, which is also the order entries are
/// written back to disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Section {
    entries: IndexMap<String, Value>,
}

impl Section {
    /// Create an empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of immediate children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no immediate children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the immediate children, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Immediate children, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Insert an immediate child, replacing any existing value of that name.
    ///
    /// The name is taken literally and is not split on separators.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(name.into(), value.into())
    }

    /// Resolve a dot-separated path to a value.
    ///
    /// The empty path resolves to nothing; use [`Section::section`] to reach
    /// the root itself.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return None;
        }
        let mut current = self;
        let mut segments = path.split(SEPARATOR).peekable();
        while let Some(segment) = segments.next() {
            let value = current.entries.get(segment)?;
            if segments.peek().is_none() {
                return Some(value);
            }
            current = value.as_section()?;
        }
        None
    }

    /// Resolve a path to a nested section. The empty path is `self`.
    pub fn section(&self, path: &str) -> Option<&Section> {
        if path.is_empty() {
            return Some(self);
        }
        self.get(path)?.as_section()
    }

    fn section_mut(&mut self, path: &str) -> Option<&mut Section> {
        let mut current = self;
        for segment in path.split(SEPARATOR) {
            current = match current.entries.get_mut(segment)? {
                Value::Section(section) => section,
                _ => return None,
            };
        }
        Some(current)
    }

    fn section_mut_or_create(&mut self, path: &str) -> &mut Section {
        let mut current = self;
        for segment in path.split(SEPARATOR) {
            let slot = current
                .entries
                .entry(segment.to_string())
                .or_insert_with(|| Value::Section(Section::new()));
            current = ensure_section(slot);
        }
        current
    }

    /// Write a value at a dot-separated path.
    ///
    /// Missing intermediate sections are created, and any scalar sitting
    /// where an intermediate section is needed is replaced. Writing to the
    /// empty path does nothing.
    pub fn set(&mut self, path: &str, value: Value) {
        if path.is_empty() {
            return;
        }
        match path::split_last(path) {
            (Some(parent), leaf) => {
                self.section_mut_or_create(parent)
                    .entries
                    .insert(leaf.to_string(), value);
            }
            (None, leaf) => {
                self.entries.insert(leaf.to_string(), value);
            }
        }
    }

    /// Remove the value at a path, returning it if it existed.
    ///
    /// Removing the empty path clears the whole section.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        if path.is_empty() {
            if self.is_empty() {
                return None;
            }
            return Some(Value::Section(std::mem::take(self)));
        }
        match path::split_last(path) {
            (Some(parent), leaf) => self.section_mut(parent)?.entries.shift_remove(leaf),
            (None, leaf) => self.entries.shift_remove(leaf),
        }
    }

    /// Every non-section value beneath this section, keyed by relative path.
    ///
    /// Nested sections are descended into rather than reported, so the
    /// result is a flat dump of leaves in document order.
    pub fn values_deep(&self) -> IndexMap<String, Value> {
        let mut out = IndexMap::new();
        self.flatten_into("", &mut out);
        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut IndexMap<String, Value>) {
        for (name, value) in &self.entries {
            let full = path::join(prefix, name);
            match value {
                Value::Section(section) => section.flatten_into(&full, out),
                other => {
                    out.insert(full, other.clone());
                }
            }
        }
    }
}

fn ensure_section(slot: &mut Value) -> &mut Section {
    if !slot.is_section() {
        *slot = Value::Section(Section::new());
    }
    match slot {
        Value::Section(section) => section,
        _ => unreachable!("slot was just replaced by a section"),
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        f.write_str("}")
    }
}

impl FromIterator<(String, Value)> for Section {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
