use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// The three flat JSON documents this site persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    ApprovedReviews,
    PendingReviews,
    RateLimits,
}

impl Collection {
    fn file_name(self) -> &'static str {
        match self {
            Collection::ApprovedReviews => "reviews_approved.json",
            Collection::PendingReviews => "reviews_pending.json",
            Collection::RateLimits => "rate_limits.json",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Flat-file JSON storage with whole-document read/write semantics.
///
/// Callers never patch a record in place: they read the whole collection,
/// mutate it in memory and write the whole thing back. All mutation happens
/// under one process-wide guard (single writer), and every write lands via a
/// temp file + rename so plain readers always see a complete document.
///
/// The guard only covers this process. Running two instances against the
/// same data directory can still lose updates; that is an accepted ceiling
/// for a single-instance, low-traffic site.
pub struct Store {
    dir: PathBuf,
    lock: Mutex<()>,
}

pub struct StoreGuard<'a>(#[allow(dead_code)] MutexGuard<'a, ()>);

impl Store {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Store {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// Take the single-writer guard. Hold it for the full read-modify-write
    /// cycle, including multi-collection transitions like approve.
    pub fn lock(&self) -> StoreGuard<'_> {
        StoreGuard(self.lock.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Read a whole collection. A missing or unparsable file reads as the
    /// empty document — the store never fails a read.
    pub fn read<T: DeserializeOwned + Default>(&self, coll: Collection) -> T {
        let path = self.path(coll);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return T::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("unparsable {}: {}", coll.file_name(), e);
                T::default()
            }
        }
    }

    /// Overwrite a whole collection. Requires the store guard so a writer
    /// cannot interleave with another read-modify-write in flight.
    pub fn write<T: Serialize>(
        &self,
        _guard: &StoreGuard<'_>,
        coll: Collection,
        doc: &T,
    ) -> Result<(), StoreError> {
        let path = self.path(coll);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let json = serde_json::to_string_pretty(doc)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::Io {
            path: path.clone(),
            source: e,
        })
    }

    /// Lock, read, mutate, write — the common single-collection cycle.
    pub fn update<T, R, F>(&self, coll: Collection, f: F) -> Result<R, StoreError>
    where
        T: DeserializeOwned + Default + Serialize,
        F: FnOnce(&mut T) -> R,
    {
        let guard = self.lock();
        let mut doc: T = self.read(coll);
        let out = f(&mut doc);
        self.write(&guard, coll, &doc)?;
        Ok(out)
    }

    fn path(&self, coll: Collection) -> PathBuf {
        self.dir.join(coll.file_name())
    }
}
