//! Shared, lockable document tree owned by a storage backend.

use std::sync::{PoisonError, RwLock};

use crate::value::Section;

/// The live in-memory tree behind every key handle of one backend.
///
/// Key handles never copy data out of the document; each read or write
/// takes the lock for the duration of one call. A panic while holding the
/// lock does not invalidate the tree, so poisoning is ignored.
#[derive(Debug, Default)]
pub struct Document {
    root: RwLock<Section>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document holding `root`.
    pub fn from_section(root: Section) -> Self {
        Self {
            root: RwLock::new(root),
        }
    }

    /// Run `f` with shared access to the root section.
    pub fn read<R>(&self, f: impl FnOnce(&Section) -> R) -> R {
        let guard = self.root.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    /// Run `f` with exclusive access to the root section.
    pub fn write<R>(&self, f: impl FnOnce(&mut Section) -> R) -> R {
        let mut guard = self.root.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Swap in a new root, returning the previous one.
    pub fn replace(&self, root: Section) -> Section {
        self.write(|current| std::mem::replace(current, root))
    }

    /// Clone the current root.
    pub fn snapshot(&self) -> Section {
        self.read(Section::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn write_then_read() {
        let doc = Document::new();
        doc.write(|root| root.set("a.b", Value::Int(1)));
        assert_eq!(doc.read(|root| root.get("a.b").cloned()), Some(Value::Int(1)));
    }

    #[test]
    fn replace_discards_previous_state() {
        let doc = Document::new();
        doc.write(|root| root.set("old", Value::Bool(true)));

        let mut fresh = Section::new();
        fresh.set("new", Value::Int(2));
        let previous = doc.replace(fresh);

        assert!(previous.get("old").is_some());
        assert!(doc.read(|root| root.get("old").is_none()));
        assert_eq!(doc.snapshot().get("new"), Some(&Value::Int(2)));
    }
}
