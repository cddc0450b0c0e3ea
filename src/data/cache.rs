use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::SystemTime;

use sha2::{Digest, Sha256};

use super::loader::{LoadError, load_file};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Dataset cache
// ---------------------------------------------------------------------------

/// Identity of a file's contents as far as the cache is concerned.
///
/// Length and mtime alone miss a same-length rewrite inside one mtime tick,
/// so the SHA-256 of the bytes is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
    digest: [u8; 32],
}

impl Fingerprint {
    fn of(path: &Path) -> Result<Self, LoadError> {
        let meta = std::fs::metadata(path).map_err(|source| io_error(path, source))?;
        let bytes = std::fs::read(path).map_err(|source| io_error(path, source))?;
        Ok(Fingerprint {
            len: meta.len(),
            modified: meta.modified().ok(),
            digest: Sha256::digest(&bytes).into(),
        })
    }
}

#[derive(Debug)]
struct Entry {
    fingerprint: Fingerprint,
    dataset: Arc<Dataset>,
}

/// Loaded datasets keyed by canonical path.
///
/// Rules:
/// * an entry is created by the first `load` of a path;
/// * a later `load` returns the same `Arc` while the file's length,
///   modification time and content hash are unchanged, otherwise it
///   re-parses the file;
/// * `invalidate` / `clear` drop entries explicitly;
/// * a failed load leaves any previous entry for that path untouched.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide instance used by the dashboard.
    pub fn global() -> &'static DatasetCache {
        static GLOBAL: OnceLock<DatasetCache> = OnceLock::new();
        GLOBAL.get_or_init(DatasetCache::new)
    }

    pub fn load(&self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let key = normalize(path)?;
        let fingerprint = Fingerprint::of(&key)?;

        if let Some(entry) = self.lock().get(&key) {
            if entry.fingerprint == fingerprint {
                log::debug!("cache hit for {}", key.display());
                return Ok(Arc::clone(&entry.dataset));
            }
            log::debug!("{} changed on disk, reloading", key.display());
        }

        let dataset = Arc::new(load_file(&key)?);
        self.lock().insert(
            key,
            Entry {
                fingerprint,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    /// Forget the entry for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: &Path) -> bool {
        let key = normalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.lock().remove(&key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Entry>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn normalize(path: &Path) -> Result<PathBuf, LoadError> {
    std::fs::canonicalize(path).map_err(|source| io_error(path, source))
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    match source.kind() {
        std::io::ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io {
            path: path.to_path_buf(),
            source,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "booking_id,origin,destination,departure_date,booking_date,price,passengers,airline,aircraft_type,class";
    const ROW: &str = "BK1,Sydney,Melbourne,2024-01-05,2024-01-01,120,1,Qantas,A320,Economy";

    #[test]
    fn unchanged_file_returns_same_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookings.csv");
        std::fs::write(&path, format!("{HEADER}\n{ROW}\n")).unwrap();

        let cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        // Same file through a non-canonical spelling.
        let second = cache.load(&dir.path().join(".").join("bookings.csv")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn rewritten_file_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookings.csv");
        std::fs::write(&path, format!("{HEADER}\n{ROW}\n")).unwrap();

        let cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        assert_eq!(first.len(), 1);

        std::fs::write(
            &path,
            format!("{HEADER}\n{ROW}\nBK2,Perth,Sydney,2024-02-01,2024-01-20,300,2,Jetstar,A321,Economy\n"),
        )
        .unwrap();
        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn invalidate_forces_a_fresh_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookings.csv");
        std::fs::write(&path, format!("{HEADER}\n{ROW}\n")).unwrap();

        let cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        assert!(cache.invalidate(&path));
        assert!(cache.is_empty());
        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        cache.clear();
        assert!(!cache.invalidate(&path));
    }

    #[test]
    fn missing_file_is_not_found_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DatasetCache::new();
        let err = cache.load(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn same_length_rewrite_is_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bookings.csv");
        std::fs::write(&path, format!("{HEADER}\n{ROW}\n")).unwrap();
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

        let cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        assert_eq!(first.bookings[0].price, 120.0);

        // Same byte length and the original mtime: only the content differs.
        let rewritten = ROW.replace(",120,", ",130,");
        std::fs::write(&path, format!("{HEADER}\n{rewritten}\n")).unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();

        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.bookings[0].price, 130.0);
    }
}
