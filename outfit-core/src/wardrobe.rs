//! Wardrobe persistence: an ordered set of unique, non-blank garment names,
//! stored one per line in a UTF-8 text file.

use parking_lot::Mutex;
use std::{
    fmt::Debug,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{error::WardrobeError, model::WardrobeText};

pub trait WardrobeStore: Send + Sync + Debug {
    /// Adds `item` unless already present; returns the updated list.
    fn append(&self, item: &str) -> Result<Vec<String>, WardrobeError>;

    fn list_all(&self) -> Result<Vec<String>, WardrobeError>;

    /// Removes `item`; fails with [`WardrobeError::NotFound`] if it is absent.
    fn remove(&self, item: &str) -> Result<Vec<String>, WardrobeError>;
}

/// Reads the wardrobe for a prompt. Never fails: an unreadable store or an
/// empty list becomes [`WardrobeText::NotRegistered`].
pub fn load_wardrobe_text(store: &dyn WardrobeStore) -> WardrobeText {
    match store.list_all() {
        Ok(items) => WardrobeText::from_items(&items),
        Err(e) => {
            warn!("Wardrobe unavailable, continuing without it: {}", e);
            WardrobeText::NotRegistered
        }
    }
}

/// Unique non-blank trimmed lines, first occurrence wins.
fn parse_items(contents: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for line in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !items.iter().any(|i| i == line) {
            items.push(line.to_string());
        }
    }
    items
}

fn normalize_item(item: &str) -> Result<&str, WardrobeError> {
    let item = item.trim();
    if item.is_empty() {
        return Err(WardrobeError::Blank);
    }
    Ok(item)
}

/// File-backed store. Every mutation holds the lock for the full
/// read-modify-write and replaces the file through a rename of a uniquely
/// named temp file, so writers from other processes never share a temp path.
#[derive(Debug)]
pub struct FileWardrobeStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileWardrobeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_items(&self) -> Result<Vec<String>, WardrobeError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(parse_items(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_items(&self, items: &[String]) -> Result<(), WardrobeError> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let mut contents = items.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl WardrobeStore for FileWardrobeStore {
    fn append(&self, item: &str) -> Result<Vec<String>, WardrobeError> {
        let item = normalize_item(item)?;
        let _guard = self.lock.lock();

        let mut items = self.read_items()?;
        if items.iter().any(|i| i == item) {
            debug!("'{}' already registered", item);
            return Ok(items);
        }

        items.push(item.to_string());
        self.write_items(&items)?;
        debug!("Registered '{}' ({} items)", item, items.len());
        Ok(items)
    }

    fn list_all(&self) -> Result<Vec<String>, WardrobeError> {
        let _guard = self.lock.lock();
        self.read_items()
    }

    fn remove(&self, item: &str) -> Result<Vec<String>, WardrobeError> {
        let item = normalize_item(item)?;
        let _guard = self.lock.lock();

        let mut items = self.read_items()?;
        let Some(pos) = items.iter().position(|i| i == item) else {
            return Err(WardrobeError::NotFound(item.to_string()));
        };

        items.remove(pos);
        self.write_items(&items)?;
        debug!("Removed '{}' ({} items left)", item, items.len());
        Ok(items)
    }
}
