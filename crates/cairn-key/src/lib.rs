//! Path-addressed key handles over a hierarchical configuration document.
//!
//! A document is a tree of named [`Section`]s holding scalar [`Value`]s.
//! Callers never walk the tree directly: they obtain a root handle from a
//! [`Storage`] backend and derive further handles by relative or absolute
//! dot-separated paths (`npc.0.name`). Every read and write through a handle
//! goes live to the backend's [`Document`].
//!
//! # Architecture
//!
//! - **Handles** are cheap values: a reference to the backend plus a path.
//!   Creating one does no I/O and does not check that the path exists.
//! - **Typed reads** never fail for missing data; they return the caller's
//!   default. Stored text is coerced to the requested type, and only
//!   malformed non-empty text produces a [`KeyError`].
//! - **Backends** own the document and decide how it is persisted.
//!
//! # Modules
//!
//! - [`error`] — Error types for key reads and storage I/O
//! - [`path`] — Dot-separated path joining and splitting
//! - [`value`] — Document tree types: [`Value`], [`Section`]
//! - [`coerce`] — Conversion rules for typed getters
//! - [`document`] — The shared, lockable [`Document`]
//! - [`traits`] — The [`DataKey`], [`Storage`] and [`FileStorage`] traits
//! - [`memory`] — In-memory [`MemoryStorage`] for tests

pub mod coerce;
pub mod document;
pub mod error;
pub mod memory;
pub mod path;
pub mod traits;
pub mod value;

pub use document::Document;
pub use error::{KeyError, KeyResult, StorageError, StorageResult};
pub use indexmap::IndexMap;
pub use memory::{MemoryKey, MemoryStorage};
pub use traits::{DataKey, FileStorage, Storage};
pub use value::{Section, Value};
