//! The video manifest: the ordered list of known videos.
//!
//! Request handlers only ever see an immutable snapshot (`Arc<Vec<_>>`);
//! writers build a new list, persist it, then swap the snapshot.

mod persist;

pub use persist::{read_manifest, write_manifest};

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vidshelf_common::{Error, Result, VideoIdentity, VideoRecord};

/// Resolves a [`VideoIdentity`] to its manifest record.
pub trait ManifestLookup: Send + Sync {
    /// Return a copy of the matching record, or [`Error::NotFound`].
    fn lookup(&self, identity: &VideoIdentity) -> Result<VideoRecord>;
}

/// Find `identity` in a record list.
pub fn find_record<'a>(records: &'a [VideoRecord], identity: &VideoIdentity) -> Option<&'a VideoRecord> {
    match identity {
        VideoIdentity::ById(index) => records.get(*index),
        VideoIdentity::ByPath(path) => records.iter().find(|r| &r.path == path),
    }
}

/// File-backed manifest with snapshot reads.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    records: RwLock<Arc<Vec<VideoRecord>>>,
}

impl ManifestStore {
    /// Load the manifest at `path` (a missing file yields an empty store).
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = read_manifest(&path)?;
        tracing::info!("Loaded {} videos from {}", records.len(), path.display());
        Ok(Self {
            path,
            records: RwLock::new(Arc::new(records)),
        })
    }

    /// Build a store from records without touching disk until the next write.
    pub fn with_records(path: impl Into<PathBuf>, records: Vec<VideoRecord>) -> Self {
        Self {
            path: path.into(),
            records: RwLock::new(Arc::new(records)),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current record list.
    pub fn snapshot(&self) -> Arc<Vec<VideoRecord>> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Persist `records` and make them the current snapshot.
    pub fn replace(&self, records: Vec<VideoRecord>) -> Result<()> {
        self.replace_with(|_| records).map(|_| ())
    }

    /// Build the next record list from the current one, persist it and make
    /// it the current snapshot, all under the write lock. Updates made by
    /// other writers before this call are visible to `build`.
    ///
    /// Returns the new record count.
    pub fn replace_with<F>(&self, build: F) -> Result<usize>
    where
        F: FnOnce(&[VideoRecord]) -> Vec<VideoRecord>,
    {
        let mut guard = self.records.write();
        let records = build(guard.as_slice());
        write_manifest(&self.path, &records)?;
        let count = records.len();
        *guard = Arc::new(records);
        Ok(count)
    }

    /// Set the `disabled` flag of the record at `path` and persist.
    pub fn set_disabled(&self, path: &Path, disabled: bool) -> Result<VideoRecord> {
        let mut guard = self.records.write();

        let mut records = guard.as_ref().clone();
        let record = records
            .iter_mut()
            .find(|r| r.path == path)
            .ok_or_else(|| Error::not_found("video", path.display()))?;
        record.disabled = disabled;
        let updated = record.clone();

        write_manifest(&self.path, &records)?;
        *guard = Arc::new(records);

        tracing::info!(
            path = %path.display(),
            disabled,
            "Video status updated"
        );
        Ok(updated)
    }
}

impl ManifestLookup for ManifestStore {
    fn lookup(&self, identity: &VideoIdentity) -> Result<VideoRecord> {
        let snapshot = self.snapshot();
        find_record(&snapshot, identity)
            .cloned()
            .ok_or_else(|| Error::not_found("video", identity))
    }
}
