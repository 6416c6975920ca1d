use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::Context;
use examguard_engine::traits::SessionStorage;

/// Session storage backed by a single JSON object on disk.
///
/// Survives a restart of the driving process, which stands in for a page
/// reload within the same browser session.
#[derive(Debug)]
pub struct FileSessionStorage {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileSessionStorage {
    /// Opens the store, reading any items already on disk.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read session storage: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse session storage: {}", path.display()))?
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(items).context("encode session storage")?;
        write_atomically(&self.path, &json)
    }
}

// The temp file lives next to `dst` so the final rename never crosses filesystems.
fn write_atomically(dst: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    let dir = match dst.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("create directory: {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;
    tmp.write_all(bytes).context("write temp file")?;
    tmp.persist(dst)
        .with_context(|| format!("replace {}", dst.display()))?;
    Ok(())
}

impl SessionStorage for FileSessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut items = self.items();
        if items.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        items.insert(key.to_string(), value.to_string());
        self.flush(&items)
            .with_context(|| format!("failed to persist {key}"))
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        let mut items = self.items();
        if items.remove(key).is_none() {
            return Ok(());
        }
        self.flush(&items)
            .with_context(|| format!("failed to remove {key}"))
    }
}
