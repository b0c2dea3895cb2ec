//! In-memory storage for testing and ephemeral use.
//!
//! [`MemoryStorage`] keeps its document in a shared [`Document`] and never
//! touches disk: `load` and `save` succeed without doing anything. It is
//! suitable for unit tests and for state that does not need to survive a
//! restart.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::document::Document;
use crate::error::StorageResult;
use crate::traits::{DataKey, Storage};
use crate::value::Section;

/// A [`Storage`] whose document lives only in memory.
///
/// Clones share the same document. Data is lost when the last clone and
/// the last key handle are dropped.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    document: Arc<Document>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `root`.
    pub fn from_section(root: Section) -> Self {
        Self {
            document: Arc::new(Document::from_section(root)),
        }
    }
}

impl PartialEq for MemoryStorage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.document, &other.document)
    }
}

impl Eq for MemoryStorage {}

impl Storage for MemoryStorage {
    type Key = MemoryKey;

    fn key(&self, root: &str) -> MemoryKey {
        MemoryKey {
            document: Arc::clone(&self.document),
            path: root.to_string(),
        }
    }

    fn try_load(&self) -> StorageResult<()> {
        Ok(())
    }

    fn try_save(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Key handle into a [`MemoryStorage`].
#[derive(Clone)]
pub struct MemoryKey {
    document: Arc<Document>,
    path: String,
}

impl DataKey for MemoryKey {
    fn path(&self) -> &str {
        &self.path
    }

    fn document(&self) -> &Document {
        &self.document
    }

    fn at_path(&self, path: String) -> Self {
        Self {
            document: Arc::clone(&self.document),
            path,
        }
    }
}

impl PartialEq for MemoryKey {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && Arc::ptr_eq(&self.document, &other.document)
    }
}

impl Eq for MemoryKey {}

impl Hash for MemoryKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        Arc::as_ptr(&self.document).hash(state);
    }
}

impl fmt::Debug for MemoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemoryKey [path={}]", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeyError;
    use crate::value::Value;
    use proptest::prelude::*;

    /// Helper: a fresh store and its root key.
    fn root() -> MemoryKey {
        MemoryStorage::new().key("")
    }

    /// Helper: a root key with three NPC entries under `npc`.
    fn populated() -> MemoryKey {
        let key = root();
        key.set_string("npc.0.name", "Bob");
        key.set_int("npc.0.health", 20);
        key.set_string("npc.1.name", "Alice");
        key.set_boolean("npc.1.spawned", true);
        key.set_string("npc.2.name", "Eve");
        key
    }

    // ---- Path derivation ----

    #[test]
    fn relative_empty_is_same_handle() {
        let key = root().relative("npc");
        assert_eq!(key.relative(""), key);
        assert_eq!(key.relative("").path(), "npc");
    }

    #[test]
    fn relative_chains_like_dotted_path() {
        let key = root();
        assert_eq!(key.relative("x").relative("y"), key.relative("x.y"));
        assert_eq!(key.relative("x.y").path(), "x.y");
    }

    #[test]
    fn from_root_ignores_current_path() {
        let key = root().relative("deep.inside");
        assert_eq!(key.from_root("other").path(), "other");
    }

    #[test]
    fn relative_index_uses_number_segment() {
        let key = root().relative("npc");
        assert_eq!(key.relative_index(3).path(), "npc.3");
    }

    #[test]
    fn name_is_last_segment() {
        let key = root();
        assert_eq!(key.relative("a.b.c").name(), "c");
        assert_eq!(key.relative("single").name(), "single");
    }

    #[test]
    fn create_relative_key_at_root_has_no_leading_separator() {
        let key = root();
        assert_eq!(key.create_relative_key("a"), "a");
        assert_eq!(key.relative("a").create_relative_key("b"), "a.b");
        assert_eq!(key.relative("a").create_relative_key(""), "a");
    }

    #[test]
    fn handles_from_different_stores_differ() {
        let a = MemoryStorage::new().key("x");
        let b = MemoryStorage::new().key("x");
        assert_ne!(a, b);

        let storage = MemoryStorage::new();
        assert_eq!(storage.key("x"), storage.clone().key("x"));
    }

    // ---- Absent keys ----

    #[test]
    fn absent_keys_read_as_defaults() {
        let key = root();
        assert!(!key.key_exists("missing"));
        assert!(!key.get_boolean("missing"));
        assert_eq!(key.get_int("missing"), Ok(0));
        assert_eq!(key.get_long("missing"), Ok(0));
        assert_eq!(key.get_double("missing"), Ok(0.0));
        assert_eq!(key.get_string("missing"), "");
        assert_eq!(key.get_raw("missing"), None);
    }

    #[test]
    fn absent_keys_use_supplied_default() {
        let key = root();
        assert!(key.get_boolean_or("missing", true));
        assert_eq!(key.get_int_or("missing", 7), Ok(7));
        assert_eq!(key.get_long_or("missing", 8), Ok(8));
        assert_eq!(key.get_double_or("missing", 9.5), Ok(9.5));
        assert_eq!(key.get_string_or("missing", "dflt"), "dflt");
    }

    // ---- Round trips ----

    #[test]
    fn typed_round_trips() {
        let key = root();
        key.set_boolean("b", true);
        key.set_int("i", -42);
        key.set_long("l", 1 << 40);
        key.set_double("d", 3.14);
        key.set_string("s", "hello");

        assert!(key.get_boolean("b"));
        assert_eq!(key.get_int("i"), Ok(-42));
        assert_eq!(key.get_long("l"), Ok(1 << 40));
        assert_eq!(key.get_double("d"), Ok(3.14));
        assert_eq!(key.get_string("s"), "hello");
    }

    #[test]
    fn double_is_stored_as_text() {
        let key = root();
        key.set_double("d", 2.0);
        assert_eq!(key.get_raw("d"), Some(Value::String("2.0".into())));
    }

    // ---- Coercion ----

    #[test]
    fn strings_coerce_to_numbers_and_booleans() {
        let key = root();
        key.set_string("n", "12");
        key.set_string("flag", "TRUE");
        assert_eq!(key.get_int("n"), Ok(12));
        assert_eq!(key.get_long("n"), Ok(12));
        assert_eq!(key.get_double("n"), Ok(12.0));
        assert!(key.get_boolean("flag"));
    }

    #[test]
    fn empty_string_yields_default() {
        let key = root();
        key.set_string("empty", "");
        assert_eq!(key.get_double_or("empty", 1.25), Ok(1.25));
        assert_eq!(key.get_long_or("empty", 99), Ok(99));
        assert_eq!(key.get_int("empty"), Ok(0));
        assert!(key.get_boolean_or("empty", true));
    }

    #[test]
    fn stored_empty_string_is_returned_as_is() {
        let key = root();
        key.set_string("s", "");
        assert_eq!(key.get_string_or("s", "fallback"), "");
        assert_eq!(key.get_string("s"), "");
        assert_eq!(key.get_string_or("unset", "fallback"), "fallback");
    }

    #[test]
    fn malformed_string_is_parse_error() {
        let key = root().relative("cfg");
        key.set_string("count", "abc");
        assert_eq!(
            key.get_int("count"),
            Err(KeyError::Parse {
                path: "cfg.count".into(),
                value: "abc".into(),
                target: "int",
            })
        );
    }

    #[test]
    fn numbers_read_as_strings() {
        let key = root();
        key.set_int("n", 5);
        key.set_boolean("b", false);
        assert_eq!(key.get_string("n"), "5");
        assert_eq!(key.get_string("b"), "false");
    }

    #[test]
    fn relative_key_reads_nested_data() {
        let key = populated();
        let bob = key.relative("npc.0");
        assert_eq!(bob.get_string("name"), "Bob");
        assert_eq!(bob.get_int("health"), Ok(20));
    }

    // ---- Removal ----

    #[test]
    fn remove_key_clears_value() {
        let key = populated();
        key.remove_key("npc.0.name");
        assert!(!key.key_exists("npc.0.name"));
        assert!(key.key_exists("npc.0.health"));
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let key = populated();
        let before = key.values_deep();
        key.remove_key("never.written");
        assert_eq!(key.values_deep(), before);
    }

    #[test]
    fn remove_subtree_via_handle() {
        let key = populated();
        key.relative("npc.1").remove();
        assert!(!key.key_exists("npc.1"));
        assert!(!key.key_exists("npc.1.name"));
        assert!(key.key_exists("npc.2"));
    }

    #[test]
    fn emptied_section_does_not_exist() {
        let key = root();
        key.set_int("only.child", 1);
        key.remove_key("only.child");
        assert!(!key.key_exists("only"));
    }

    // ---- Enumeration ----

    #[test]
    fn sub_keys_returns_immediate_children() {
        let key = populated();
        let npc = key.relative("npc");
        let subs = npc.sub_keys();
        let names: Vec<&str> = subs.iter().map(DataKey::name).collect();
        assert_eq!(names, ["0", "1", "2"]);
        assert!(subs.iter().all(DataKey::exists));
        assert_eq!(subs[1], key.relative("npc.1"));
    }

    #[test]
    fn sub_keys_of_scalar_or_missing_is_empty() {
        let key = populated();
        assert!(key.relative("npc.0.name").sub_keys().is_empty());
        assert!(key.relative("nothing").sub_keys().is_empty());
    }

    #[test]
    fn sub_keys_follow_insertion_order() {
        let key = root();
        key.set_int("list.zeta", 1);
        key.set_int("list.alpha", 2);
        let names: Vec<String> = key
            .relative("list")
            .sub_keys()
            .iter()
            .map(|k| k.name().to_string())
            .collect();
        assert_eq!(names, ["zeta", "alpha"]);
    }

    #[test]
    fn integer_sub_keys_sorted_numerically() {
        let key = root().relative("npc");
        key.set_string("10.name", "ten");
        key.set_string("2.name", "two");
        key.set_string("meta", "skip");
        key.set_string("1.name", "one");
        let names: Vec<String> = key
            .integer_sub_keys()
            .iter()
            .map(|k| k.name().to_string())
            .collect();
        assert_eq!(names, ["1", "2", "10"]);
    }

    #[test]
    fn values_deep_relative_to_key() {
        let key = populated();
        let deep = key.relative("npc.1").values_deep();
        assert_eq!(deep.len(), 2);
        assert_eq!(deep["name"], Value::String("Alice".into()));
        assert_eq!(deep["spawned"], Value::Bool(true));
        assert!(key.relative("missing").values_deep().is_empty());
    }

    #[test]
    fn root_values_deep_has_full_paths() {
        let key = populated();
        let deep = key.values_deep();
        assert_eq!(deep.len(), 5);
        assert!(deep.contains_key("npc.0.health"));
    }

    // ---- Writes ----

    #[test]
    fn overwrite_changes_type() {
        let key = root();
        key.set_int("x", 1);
        key.set_string("x.y", "nested");
        assert_eq!(key.get_string("x.y"), "nested");
        assert!(key.get_raw("x").unwrap().is_section());
    }

    #[test]
    fn root_write_is_ignored() {
        let key = root();
        key.set_int("", 5);
        assert!(key.values_deep().is_empty());
    }

    #[test]
    fn storage_load_and_save_are_noops() {
        let storage = MemoryStorage::new();
        storage.key("").set_int("a", 1);
        assert!(storage.load());
        storage.save();
        assert_eq!(storage.key("a").get_int(""), Ok(1));
    }

    proptest! {
        #[test]
        fn long_round_trip(v in any::<i64>()) {
            let key = root();
            key.set_long("v", v);
            prop_assert_eq!(key.get_long("v"), Ok(v));
        }

        #[test]
        fn double_round_trip(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let key = root();
            key.set_double("v", v);
            prop_assert_eq!(key.get_double("v"), Ok(v));
        }

        #[test]
        fn string_round_trip(s in "[ -~]{1,24}") {
            let key = root();
            key.set_string("v", &s);
            prop_assert_eq!(key.get_string("v"), s);
        }
    }
}
