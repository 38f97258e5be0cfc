use std::path::Path;

use storage::{FileStorage, Storage};
use tracing::{debug, info, warn};

use crate::{Entry, IndexError, IndexValue, DEFAULT_FLUSH_THRESHOLD};

/// Entries decoded per read while loading, bounding the temporary byte buffer.
const LOAD_CHUNK_ENTRIES: usize = 64 * 1024;

/// Identifier -> location table with a bounded write buffer and a sorted,
/// fully materialized read side.
///
/// One instance is used either for writing (`write` + `flush_to_file`) or
/// for reading (`load_into_memory` + lookups), never both. Buffered writes
/// are not visible to lookups.
pub struct OffsetIndex<V: IndexValue, S: Storage = FileStorage> {
    /// Name used in diagnostics, usually the backing file path.
    name: String,
    storage: S,
    /// Write buffer in arrival order, or the sorted table once loaded.
    entries: Vec<Entry<V>>,
    flush_threshold: usize,
    /// Set by `load_into_memory`; `entries` is sorted while this holds.
    loaded: bool,
    /// Reusable encode buffer for flushes.
    scratch: Vec<u8>,
}

impl<V: IndexValue> OffsetIndex<V, FileStorage> {
    /// Creates (or truncates) an offset file for a write pass.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let name = path.as_ref().display().to_string();
        Ok(Self::new(FileStorage::create(path)?, name))
    }

    /// Opens an existing offset file for a read pass.
    ///
    /// The table is empty until [`load_into_memory`](Self::load_into_memory).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IndexError> {
        let name = path.as_ref().display().to_string();
        Ok(Self::new(FileStorage::open(path)?, name))
    }
}

impl<V: IndexValue, S: Storage> OffsetIndex<V, S> {
    pub fn new(storage: S, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            storage,
            entries: Vec::new(),
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            loaded: false,
            scratch: Vec::new(),
        }
    }

    /// Overrides the write buffer bound (clamped to at least 1).
    #[must_use]
    pub fn with_flush_threshold(mut self, entries: usize) -> Self {
        self.flush_threshold = entries.max(1);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn flush_threshold(&self) -> usize {
        self.flush_threshold
    }

    /// Number of entries held in memory: the write buffer before loading,
    /// the whole table after.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries written but not yet flushed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        if self.loaded {
            0
        } else {
            self.entries.len()
        }
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Buffers `(id, value)`, spilling the buffer first if it has grown past
    /// the flush threshold. No ordering is required of the caller.
    pub fn write(&mut self, id: u64, value: V) -> Result<(), IndexError> {
        debug_assert!(!self.loaded, "write to offset index {} loaded for reading", self.name);
        if self.entries.len() > self.flush_threshold {
            self.flush_to_file()?;
        }
        self.entries.push(Entry::new(id, value));
        Ok(())
    }

    /// Appends the whole write buffer to the backing storage, unsorted, and
    /// clears it. A no-op when the buffer is empty.
    pub fn flush_to_file(&mut self) -> Result<(), IndexError> {
        if self.loaded || self.entries.is_empty() {
            return Ok(());
        }

        self.scratch.clear();
        self.scratch
            .reserve(self.entries.len() * Entry::<V>::ENCODED_LEN);
        for e in &self.entries {
            e.encode_into(&mut self.scratch);
        }
        self.storage.append(&self.scratch)?;

        debug!(name = %self.name, entries = self.entries.len(), "flushed offsets");
        self.entries.clear();
        Ok(())
    }

    /// Pushes flushed entries down to the medium.
    pub fn sync(&mut self) -> Result<(), IndexError> {
        self.storage.sync()?;
        Ok(())
    }

    /// Reads the complete backing storage and sorts it by `(id, value)`.
    ///
    /// # Errors
    ///
    /// - [`IndexError::SizeOverflow`] if the file cannot be addressed in memory.
    /// - [`IndexError::ResourceExhausted`] if the table cannot be allocated.
    /// - [`IndexError::Truncated`] if the file does not hold whole entries.
    /// - [`IndexError::Io`] on read failure.
    pub fn load_into_memory(&mut self) -> Result<(), IndexError> {
        if !self.loaded && !self.entries.is_empty() {
            warn!(
                name = %self.name,
                entries = self.entries.len(),
                "discarding unflushed offsets before load"
            );
        }
        self.entries = Vec::new();
        self.loaded = true;

        let file_len = self.storage.len();
        if file_len == 0 {
            return Ok(());
        }

        let entry_len = Entry::<V>::ENCODED_LEN;
        if file_len % entry_len as u64 != 0 {
            return Err(IndexError::Truncated {
                name: self.name.clone(),
                len: file_len,
                entry_len,
            });
        }
        let count = usize::try_from(file_len)
            .ok()
            .map(|len| len / entry_len)
            .ok_or_else(|| IndexError::SizeOverflow {
                name: self.name.clone(),
                len: file_len,
            })?;

        info!(name = %self.name, bytes = file_len, "reading offsets started");

        self.entries
            .try_reserve_exact(count)
            .map_err(|_| IndexError::ResourceExhausted {
                name: self.name.clone(),
                entries: count,
            })?;

        let mut chunk = vec![0u8; count.min(LOAD_CHUNK_ENTRIES) * entry_len];
        let mut offset = 0u64;
        let mut remaining = count;
        while remaining > 0 {
            let n = remaining.min(LOAD_CHUNK_ENTRIES);
            let bytes = &mut chunk[..n * entry_len];
            self.storage.read_exact_at(offset, bytes)?;
            self.entries
                .extend(bytes.chunks_exact(entry_len).map(Entry::decode));
            offset += bytes.len() as u64;
            remaining -= n;
        }

        self.entries.sort_unstable();

        info!(name = %self.name, entries = count, "reading offsets finished");
        Ok(())
    }

    /// Returns the value of the first entry with `id`.
    ///
    /// Meant for tables where ids are unique. With duplicates the smallest
    /// value is returned; use [`equal_range`](Self::equal_range) to see all.
    #[must_use]
    pub fn read_one(&self, id: u64) -> Option<V> {
        let i = self.lower_bound(id);
        self.entries
            .get(i)
            .filter(|e| e.id == id)
            .map(|e| e.value)
    }

    /// All loaded entries with `id`, in ascending value order.
    #[must_use]
    pub fn equal_range(&self, id: u64) -> &[Entry<V>] {
        let lo = self.lower_bound(id);
        let hi = lo + self.entries[lo..].partition_point(|e| e.id <= id);
        &self.entries[lo..hi]
    }

    /// Calls `visit` for each value stored under `id`, in ascending order,
    /// until it returns `true`.
    ///
    /// Returns `true` if the visitor stopped the iteration.
    pub fn for_each_match<F>(&self, id: u64, mut visit: F) -> bool
    where
        F: FnMut(&V) -> bool,
    {
        self.equal_range(id).iter().any(|e| visit(&e.value))
    }

    /// Checks that no id appears twice in the loaded table.
    pub fn ensure_unique(&self) -> Result<(), IndexError> {
        match self.entries.windows(2).find(|w| w[0].id == w[1].id) {
            Some(w) => Err(IndexError::DuplicateKey {
                name: self.name.clone(),
                id: w[0].id,
            }),
            None => Ok(()),
        }
    }

    /// Iterates the in-memory entries (sorted once loaded).
    pub fn iter(&self) -> impl Iterator<Item = &Entry<V>> {
        self.entries.iter()
    }

    fn lower_bound(&self, id: u64) -> usize {
        if !self.loaded {
            return self.entries.len();
        }
        self.entries.partition_point(|e| e.id < id)
    }
}

impl<V: IndexValue, S: Storage> std::fmt::Debug for OffsetIndex<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffsetIndex")
            .field("name", &self.name)
            .field("loaded", &self.loaded)
            .field("entries", &self.entries.len())
            .field("flush_threshold", &self.flush_threshold)
            .field("storage_bytes", &self.storage.len())
            .finish()
    }
}

/// Unflushed write-side entries cannot be saved from `Drop` without hiding
/// I/O errors, so they are only reported.
impl<V: IndexValue, S: Storage> Drop for OffsetIndex<V, S> {
    fn drop(&mut self) {
        if !self.loaded && !self.entries.is_empty() {
            warn!(
                name = %self.name,
                entries = self.entries.len(),
                "offset index dropped with unflushed entries"
            );
        }
    }
}
