//! Id -> record stores: a data file plus its offset table.
//!
//! ## Write pass
//!
//! ```text
//! write(id, rec)  ->  rec.encode(scratch)               (may fail, nothing recorded)
//!                 ->  offsets.write(id, stream.pos())   (offset first)
//!                 ->  stream.append(scratch)            (then the bytes)
//! save_offsets()  ->  flush the tail of the offset buffer
//! ```
//!
//! ## Read pass
//!
//! ```text
//! load_offsets()  ->  load + sort the whole offset file
//! read(id)        ->  binary search -> seek -> decode
//! ```

use std::marker::PhantomData;
use std::path::Path;

use offsets::OffsetIndex;
use storage::{FileStorage, Record, RecordStream, Storage};
use tracing::warn;

use crate::CacheError;

/// Write side of a keyed record store.
///
/// [`save_offsets`](KeyedWriter::save_offsets) must be called once the pass
/// is over; offsets still buffered when the writer is dropped are lost.
pub struct KeyedWriter<T: Record, S: Storage = FileStorage> {
    stream: RecordStream<S>,
    offsets: OffsetIndex<u64, S>,
    written: u64,
    /// Encoded form of the record being written.
    scratch: Vec<u8>,
    _record: PhantomData<fn(&T)>,
}

impl<T: Record> KeyedWriter<T, FileStorage> {
    /// Creates (or truncates) `path` and its `.offs` companion.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let stream = RecordStream::create(path)?;
        let offsets = OffsetIndex::create(config::offsets_path(path))?;
        Ok(Self::from_parts(stream, offsets))
    }
}

impl<T: Record, S: Storage> KeyedWriter<T, S> {
    pub fn from_parts(stream: RecordStream<S>, offsets: OffsetIndex<u64, S>) -> Self {
        Self {
            stream,
            offsets,
            written: 0,
            scratch: Vec::new(),
            _record: PhantomData,
        }
    }

    #[must_use]
    pub fn with_flush_threshold(mut self, entries: usize) -> Self {
        self.offsets = self.offsets.with_flush_threshold(entries);
        self
    }

    /// Appends `record` under `id` and returns the offset it was written at.
    ///
    /// The record is encoded before anything is recorded, so a record that
    /// fails to encode leaves both files untouched.
    pub fn write(&mut self, id: u64, record: &T) -> Result<u64, CacheError> {
        self.scratch.clear();
        record.encode(&mut self.scratch)?;

        let offset = self.stream.pos();
        self.offsets.write(id, offset)?;
        let at = self.stream.append(&self.scratch)?;
        debug_assert_eq!(at, offset);
        self.written += 1;
        Ok(offset)
    }

    /// Flushes the remaining offsets and syncs both files.
    pub fn save_offsets(&mut self) -> Result<(), CacheError> {
        self.offsets.flush_to_file()?;
        self.offsets.sync()?;
        self.stream.sync()?;
        Ok(())
    }

    /// Records written so far.
    #[must_use]
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn data_storage(&self) -> &S {
        self.stream.storage()
    }

    pub fn offsets_storage(&self) -> &S {
        self.offsets.storage()
    }
}

/// Read side of a keyed record store.
///
/// [`load_offsets`](KeyedReader::load_offsets) (or
/// [`load_offsets_multi`](KeyedReader::load_offsets_multi)) must be called
/// before any read.
pub struct KeyedReader<T: Record, S: Storage = FileStorage> {
    stream: RecordStream<S>,
    offsets: OffsetIndex<u64, S>,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> KeyedReader<T, FileStorage> {
    /// Opens `path` and its `.offs` companion. Offsets are not loaded yet.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let stream = RecordStream::open(path)?;
        let offsets = OffsetIndex::open(config::offsets_path(path))?;
        Ok(Self::from_parts(stream, offsets))
    }
}

impl<T: Record, S: Storage> KeyedReader<T, S> {
    pub fn from_parts(stream: RecordStream<S>, offsets: OffsetIndex<u64, S>) -> Self {
        Self {
            stream,
            offsets,
            _record: PhantomData,
        }
    }

    /// Loads the offset table and checks every id was written once.
    ///
    /// [`read`](Self::read) relies on ids being unique; a store written
    /// with repeated ids fails here with `IndexError::DuplicateKey`.
    pub fn load_offsets(&mut self) -> Result<(), CacheError> {
        self.offsets.load_into_memory()?;
        self.offsets.ensure_unique()?;
        Ok(())
    }

    /// Loads the offset table without the uniqueness check, for stores that
    /// are read through [`read_all`](Self::read_all).
    pub fn load_offsets_multi(&mut self) -> Result<(), CacheError> {
        self.offsets.load_into_memory()?;
        Ok(())
    }

    /// Reads the record stored under `id`.
    ///
    /// A missing id is not an error: ids outside the processed region are
    /// expected. It is logged and `Ok(None)` is returned.
    pub fn read(&mut self, id: u64) -> Result<Option<T>, CacheError> {
        self.check_loaded()?;
        match self.offsets.read_one(id) {
            Some(pos) => Ok(Some(self.stream.read_at(pos)?)),
            None => {
                warn!(file = %self.offsets.name(), id, "can't find offset");
                Ok(None)
            }
        }
    }

    /// Decodes every record stored under `id`, in write order, until
    /// `visit` returns `true`.
    ///
    /// Returns `true` if the visitor stopped the iteration.
    pub fn read_all<F>(&mut self, id: u64, mut visit: F) -> Result<bool, CacheError>
    where
        F: FnMut(T) -> bool,
    {
        self.check_loaded()?;
        // offsets grow with every write, so value order is write order
        for e in self.offsets.equal_range(id) {
            let record = self.stream.read_at(e.value)?;
            if visit(record) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.offsets.read_one(id).is_some()
    }

    /// Number of offsets loaded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    fn check_loaded(&self) -> Result<(), CacheError> {
        if self.offsets.is_loaded() {
            Ok(())
        } else {
            Err(CacheError::OffsetsNotLoaded(self.offsets.name().to_string()))
        }
    }
}
