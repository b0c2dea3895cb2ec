//! The file-backed [`YamlStorage`] and its [`YamlKey`] handles.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use cairn_key::{DataKey, Document, FileStorage, Storage, StorageError, StorageResult};
use tracing::{debug, error, info};

use crate::config::YamlStorageConfig;
use crate::format;

/// State shared by a storage and every key handle minted from it.
struct Shared {
    file: PathBuf,
    header: RwLock<Option<String>>,
    size_limit: Option<u64>,
    document: Document,
}

/// A document persisted to a single YAML file.
///
/// Construction guarantees the file exists: a missing file (and its parent
/// directories) is created and written immediately. An existing file is
/// not read until [`Storage::load`] is called, so the in-memory document
/// starts empty.
///
/// Saves write a temporary file next to the target and rename it into
/// place, so a crash mid-write never leaves a half-written target.
///
/// Clones share the same document. Two storages compare equal when they
/// point at the same file, regardless of what they hold in memory.
#[derive(Clone)]
pub struct YamlStorage {
    shared: Arc<Shared>,
}

impl YamlStorage {
    /// Open `file` with the default configuration.
    pub fn open(file: impl Into<PathBuf>) -> Self {
        Self::with_config(file, YamlStorageConfig::default())
    }

    /// Open `file`, writing `header` at the top if the file is created.
    pub fn with_header(file: impl Into<PathBuf>, header: impl Into<String>) -> Self {
        Self::with_config(file, YamlStorageConfig::with_header(header))
    }

    /// Open `file` with an explicit configuration.
    pub fn with_config(file: impl Into<PathBuf>, config: YamlStorageConfig) -> Self {
        let storage = Self {
            shared: Arc::new(Shared {
                file: file.into(),
                header: RwLock::new(None),
                size_limit: config.effective_size_limit(),
                document: Document::new(),
            }),
        };
        if !storage.shared.file.exists() {
            storage.create();
            if config.header.is_some() {
                storage.set_header(config.header);
            }
            storage.save();
        }
        storage
    }

    fn create(&self) {
        let file = &self.shared.file;
        info!(file = %file.display(), "creating file");
        if let Err(err) = create_empty_file(file) {
            error!(file = %file.display(), error = %err, "could not create file");
        }
    }

    /// The comment header written at the top of the file, if any.
    pub fn header(&self) -> Option<String> {
        self.shared
            .header
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the comment header used by subsequent saves.
    pub fn set_header(&self, header: Option<String>) {
        *self
            .shared
            .header
            .write()
            .unwrap_or_else(PoisonError::into_inner) = header;
    }

    /// The size cap applied by `load`, if any.
    pub fn size_limit(&self) -> Option<u64> {
        self.shared.size_limit
    }

    fn read_text(&self) -> StorageResult<String> {
        let path = &self.shared.file;
        let check = |size: u64| match self.shared.size_limit {
            Some(limit) if size > limit => Err(StorageError::DocumentTooLarge {
                path: path.clone(),
                size,
                limit,
            }),
            _ => Ok(()),
        };
        let mut file = File::open(path)?;
        check(file.metadata()?.len())?;
        let mut text = String::new();
        file.read_to_string(&mut text)?;
        // The file may have grown since the metadata check.
        check(text.len() as u64)?;
        Ok(text)
    }
}

fn create_empty_file(file: &Path) -> io::Result<()> {
    if let Some(parent) = parent_dir(file) {
        fs::create_dir_all(parent)?;
    }
    match OpenOptions::new().write(true).create_new(true).open(file) {
        Ok(_) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err),
    }
}

/// Permissions a saved file should carry: those of the file it replaces,
/// or the process default when there is nothing to replace yet.
fn target_permissions(file: &Path) -> io::Result<fs::Permissions> {
    match fs::metadata(file) {
        Ok(meta) => Ok(meta.permissions()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            create_empty_file(file)?;
            Ok(fs::metadata(file)?.permissions())
        }
        Err(err) => Err(err),
    }
}

/// Parent directory of `file`, or `None` for a bare file name.
fn parent_dir(file: &Path) -> Option<&Path> {
    file.parent().filter(|p| !p.as_os_str().is_empty())
}

impl Storage for YamlStorage {
    type Key = YamlKey;

    fn key(&self, root: &str) -> YamlKey {
        YamlKey {
            storage: self.clone(),
            path: root.to_string(),
        }
    }

    fn try_load(&self) -> StorageResult<()> {
        let text = self.read_text()?;
        let parsed = format::parse(&self.shared.file, &text)?;
        self.shared.document.replace(parsed.root);
        self.set_header(parsed.header);
        debug!(file = %self.shared.file.display(), "loaded document");
        Ok(())
    }

    fn try_save(&self) -> StorageResult<()> {
        let file = &self.shared.file;
        let dir = parent_dir(file).unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let header = self.header();
        let text = self
            .shared
            .document
            .read(|root| format::render(header.as_deref(), root))?;

        let permissions = target_permissions(file)?;
        let prefix = file.file_name().unwrap_or(file.as_os_str());
        let mut temp = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".tmp")
            .tempfile_in(dir)?;
        // Temp files are created owner-only; the replacement keeps the
        // target's mode instead.
        temp.as_file().set_permissions(permissions)?;
        temp.write_all(text.as_bytes())?;
        temp.as_file().sync_all()?;

        match fs::remove_file(file) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        // A failed rename hands the temp file back inside the error; dropping
        // it deletes the leftover.
        temp.persist(file).map_err(|err| StorageError::Io(err.error))?;

        debug!(file = %file.display(), bytes = text.len(), "saved document");
        Ok(())
    }
}

impl FileStorage for YamlStorage {
    fn file(&self) -> &Path {
        &self.shared.file
    }
}

impl PartialEq for YamlStorage {
    fn eq(&self, other: &Self) -> bool {
        self.shared.file == other.shared.file
    }
}

impl Eq for YamlStorage {}

impl Hash for YamlStorage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.shared.file.hash(state);
    }
}

impl fmt::Debug for YamlStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YamlStorage {{file={}}}", self.shared.file.display())
    }
}

impl fmt::Display for YamlStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Key handle into a [`YamlStorage`].
///
/// Equal to another handle only when both share a path and were minted
/// from the same storage instance (clones of a storage count as the same
/// instance).
#[derive(Clone)]
pub struct YamlKey {
    storage: YamlStorage,
    path: String,
}

impl YamlKey {
    /// The storage this key reads from and writes to.
    pub fn storage(&self) -> &YamlStorage {
        &self.storage
    }
}

impl DataKey for YamlKey {
    fn path(&self) -> &str {
        &self.path
    }

    fn document(&self) -> &Document {
        &self.storage.shared.document
    }

    fn at_path(&self, path: String) -> Self {
        Self {
            storage: self.storage.clone(),
            path,
        }
    }
}

impl PartialEq for YamlKey {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && Arc::ptr_eq(&self.storage.shared, &other.storage.shared)
    }
}

impl Eq for YamlKey {}

impl Hash for YamlKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        Arc::as_ptr(&self.storage.shared).hash(state);
    }
}

impl fmt::Debug for YamlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "YamlKey [path={}]", self.path)
    }
}

impl fmt::Display for YamlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
