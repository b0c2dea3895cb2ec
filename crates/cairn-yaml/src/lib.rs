//! YAML file backend for cairn key stores.
//!
//! [`YamlStorage`] keeps one document per file. Key handles minted from it
//! ([`YamlKey`]) read and write the in-memory document; the file is only
//! touched by `load` and `save`, which the host calls when it sees fit
//! (startup, shutdown, a maintenance timer).
//!
//! # Durability
//!
//! Every save serializes the whole document to a temporary file in the
//! target's directory, removes the old file, and renames the temporary file
//! into place. The rename stays on one filesystem, so readers see either
//! the old document or the new one, never a torn write. A crash between
//! the remove and the rename leaves no target file; the next successful
//! save restores it.
//!
//! # Example
//!
//! ```no_run
//! use cairn_key::{DataKey, Storage};
//! use cairn_yaml::YamlStorage;
//!
//! let storage = YamlStorage::with_header("data/saves.yml", "NPC saves");
//! storage.load();
//! let npc = storage.key("npc").relative_index(0);
//! npc.set_string("name", "Bob");
//! npc.set_double("speed", 1.5);
//! storage.save();
//! ```

mod config;
mod format;
mod storage;

pub use config::{YamlStorageConfig, DEFAULT_MAX_DOCUMENT_BYTES};
pub use storage::{YamlKey, YamlStorage};
