//! The [`DataKey`] and [`Storage`] traits.
//!
//! A backend implements [`Storage`] to mint root handles and to move its
//! document to and from durable form. Its key type implements the three
//! required [`DataKey`] methods; navigation, typed reads and writes, and
//! enumeration are provided on top of them, so every backend's keys behave
//! identically.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{error, warn};

use crate::coerce::{self, Numeric};
use crate::document::Document;
use crate::error::{KeyResult, StorageResult};
use crate::path;
use crate::value::Value;

/// Run `f` against the value at `key` relative to `handle`.
///
/// Values that do not count as stored (see [`Value::is_present`]) are
/// passed as `None`.
fn with_value<K, R>(handle: &K, key: &str, f: impl FnOnce(&str, Option<&Value>) -> R) -> R
where
    K: DataKey,
{
    let path = handle.create_relative_key(key);
    handle
        .document()
        .read(|root| f(&path, root.get(&path).filter(|v| v.is_present())))
}

/// An addressable view onto one path of a backend's document.
///
/// Handles are cheap to create and clone: they hold a reference to the
/// backend and an absolute path, never a copy of the data. Two handles are
/// equal when they share a path and the same backend instance.
pub trait DataKey: Clone + fmt::Debug + PartialEq {
    /// Absolute path of this key. The root is the empty string.
    fn path(&self) -> &str;

    /// The live document this key reads from and writes to.
    fn document(&self) -> &Document;

    /// A new handle at `path` bound to the same backend.
    fn at_path(&self, path: String) -> Self;

    /// Absolute path of `relative` resolved against this key.
    fn create_relative_key(&self, relative: &str) -> String {
        path::join(self.path(), relative)
    }

    /// Handle for a path relative to this key.
    ///
    /// An empty `relative` yields a handle equal to `self`.
    fn relative(&self, relative: &str) -> Self {
        if relative.is_empty() {
            return self.clone();
        }
        self.at_path(self.create_relative_key(relative))
    }

    /// Handle for the numbered child `index` of this key.
    fn relative_index(&self, index: usize) -> Self {
        self.relative(&index.to_string())
    }

    /// Handle for an absolute path, ignoring this key's path.
    fn from_root(&self, path: &str) -> Self {
        self.at_path(path.to_string())
    }

    /// Last segment of this key's path.
    fn name(&self) -> &str {
        path::name(self.path())
    }

    /// Whether anything is stored at `key`.
    fn key_exists(&self, key: &str) -> bool {
        with_value(self, key, |_, value| value.is_some())
    }

    /// Whether anything is stored at this key.
    fn exists(&self) -> bool {
        self.key_exists("")
    }

    /// The stored value at `key` without coercion.
    fn get_raw(&self, key: &str) -> Option<Value> {
        with_value(self, key, |_, value| value.cloned())
    }

    fn get_boolean(&self, key: &str) -> bool {
        self.get_boolean_or(key, false)
    }

    fn get_boolean_or(&self, key: &str, default: bool) -> bool {
        with_value(self, key, |_, value| {
            value.map_or(default, |v| coerce::to_bool(v, default))
        })
    }

    fn get_int(&self, key: &str) -> KeyResult<i32> {
        self.get_int_or(key, 0)
    }

    fn get_int_or(&self, key: &str, default: i32) -> KeyResult<i32> {
        get_number(self, key, default)
    }

    fn get_long(&self, key: &str) -> KeyResult<i64> {
        self.get_long_or(key, 0)
    }

    fn get_long_or(&self, key: &str, default: i64) -> KeyResult<i64> {
        get_number(self, key, default)
    }

    fn get_double(&self, key: &str) -> KeyResult<f64> {
        self.get_double_or(key, 0.0)
    }

    fn get_double_or(&self, key: &str, default: f64) -> KeyResult<f64> {
        get_number(self, key, default)
    }

    fn get_string(&self, key: &str) -> String {
        self.get_string_or(key, "")
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        with_value(self, key, |_, value| {
            value.map_or_else(|| default.to_string(), coerce::to_text)
        })
    }

    /// Store `value` at `key`, replacing whatever was there.
    fn set_raw(&self, key: &str, value: impl Into<Value>) {
        let path = self.create_relative_key(key);
        if path.is_empty() {
            warn!("ignoring write to the document root");
            return;
        }
        let value = value.into();
        self.document().write(|root| root.set(&path, value));
    }

    fn set_boolean(&self, key: &str, value: bool) {
        self.set_raw(key, value);
    }

    fn set_int(&self, key: &str, value: i32) {
        self.set_raw(key, value);
    }

    fn set_long(&self, key: &str, value: i64) {
        self.set_raw(key, value);
    }

    /// Doubles are stored in text form so they survive a save and reload
    /// with their exact digits.
    fn set_double(&self, key: &str, value: f64) {
        self.set_raw(key, coerce::format_double(value));
    }

    fn set_string(&self, key: &str, value: &str) {
        self.set_raw(key, value);
    }

    /// Delete the value or subtree at `key`. Missing keys are ignored.
    fn remove_key(&self, key: &str) {
        let path = self.create_relative_key(key);
        self.document().write(|root| {
            root.remove(&path);
        });
    }

    /// Delete this key's value or subtree.
    fn remove(&self) {
        self.remove_key("");
    }

    /// One handle per immediate child, in document order.
    ///
    /// Empty when this key is a scalar or does not exist.
    fn sub_keys(&self) -> Vec<Self> {
        let names: Vec<String> = self.document().read(|root| {
            root.section(self.path())
                .map(|section| section.keys().cloned().collect())
                .unwrap_or_default()
        });
        names.iter().map(|name| self.relative(name)).collect()
    }

    /// Sub keys whose names are integers, in ascending numeric order.
    fn integer_sub_keys(&self) -> Vec<Self> {
        let mut numbered: Vec<(i64, Self)> = self
            .sub_keys()
            .into_iter()
            .filter_map(|key| {
                let n = key.name().parse::<i64>().ok()?;
                Some((n, key))
            })
            .collect();
        numbered.sort_by_key(|(n, _)| *n);
        numbered.into_iter().map(|(_, key)| key).collect()
    }

    /// Every leaf value beneath this key, keyed by path relative to it.
    fn values_deep(&self) -> IndexMap<String, Value> {
        self.document().read(|root| {
            root.section(self.path())
                .map(|section| section.values_deep())
                .unwrap_or_default()
        })
    }
}

fn get_number<K, T>(handle: &K, key: &str, default: T) -> KeyResult<T>
where
    K: DataKey,
    T: Numeric,
{
    with_value(handle, key, |path, value| match value {
        Some(v) => coerce::to_number(path, v, default),
        None => Ok(default),
    })
}

/// A backend that owns a document and hands out key handles onto it.
///
/// `load` and `save` are the contract-level entry points: they report
/// failures through the log and never propagate them. Callers that want
/// the underlying error use `try_load` and `try_save`.
pub trait Storage {
    type Key: DataKey;

    /// Mint a handle at an absolute path, usually `""` for the root.
    fn key(&self, root: &str) -> Self::Key;

    /// Replace the in-memory document with the durable copy.
    fn try_load(&self) -> StorageResult<()>;

    /// Write the full in-memory document to durable form.
    fn try_save(&self) -> StorageResult<()>;

    /// Load, returning whether it succeeded.
    fn load(&self) -> bool {
        match self.try_load() {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "failed to load storage");
                false
            }
        }
    }

    /// Save, logging any failure.
    fn save(&self) {
        if let Err(err) = self.try_save() {
            error!(error = %err, "failed to save storage");
        }
    }
}

/// A [`Storage`] persisted to a single file.
pub trait FileStorage: Storage {
    /// The backing file.
    fn file(&self) -> &Path;
}
