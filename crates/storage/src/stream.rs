use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::{FileStorage, Record, Storage};

/// Read buffer used while decoding a single record.
const READ_BUF_BYTES: usize = 8 * 1024;

/// Position-tracking stream of records over a [`Storage`].
///
/// The write position is always the end of the storage; every append
/// returns the offset it was written at. The read cursor is independent and
/// only moves through [`seek`](RecordStream::seek) and the `read*` methods.
pub struct RecordStream<S: Storage = FileStorage> {
    storage: S,
    read_pos: u64,
    /// Reusable encode buffer, so each record reaches the storage in one append.
    scratch: Vec<u8>,
}

impl RecordStream<FileStorage> {
    /// Creates (or truncates) a data file for writing.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(FileStorage::create(path)?))
    }

    /// Opens an existing data file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(FileStorage::open(path)?))
    }
}

impl<S: Storage> RecordStream<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            read_pos: 0,
            scratch: Vec::with_capacity(256),
        }
    }

    /// Offset the next append will be written at.
    #[must_use]
    pub fn pos(&self) -> u64 {
        self.storage.len()
    }

    /// Current read cursor.
    #[must_use]
    pub fn read_pos(&self) -> u64 {
        self.read_pos
    }

    /// Appends raw bytes and returns the offset they start at.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<u64> {
        self.storage.append(bytes)
    }

    /// Encodes `record` and appends it, returning the offset it starts at.
    pub fn write<T: Record>(&mut self, record: &T) -> io::Result<u64> {
        self.scratch.clear();
        record.encode(&mut self.scratch)?;
        self.storage.append(&self.scratch)
    }

    /// Moves the read cursor to `offset`.
    pub fn seek(&mut self, offset: u64) {
        self.read_pos = offset;
    }

    /// Decodes one record at the read cursor and advances the cursor past it.
    ///
    /// On error the cursor is left where it was.
    pub fn read<T: Record>(&mut self) -> io::Result<T> {
        let cursor = StorageCursor {
            storage: &mut self.storage,
            pos: self.read_pos,
        };
        let mut r = BufReader::with_capacity(READ_BUF_BYTES, cursor);
        let record = T::decode(&mut r)?;

        // BufReader may have pulled bytes past the end of this record
        let unread = r.buffer().len() as u64;
        self.read_pos = r.into_inner().pos - unread;
        Ok(record)
    }

    /// Seeks to `offset` and decodes one record.
    pub fn read_at<T: Record>(&mut self, offset: u64) -> io::Result<T> {
        self.seek(offset);
        self.read()
    }

    pub fn sync(&mut self) -> io::Result<()> {
        self.storage.sync()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// `Read` adaptor over a storage, starting at a fixed offset.
struct StorageCursor<'a, S: Storage> {
    storage: &'a mut S,
    pos: u64,
}

impl<S: Storage> Read for StorageCursor<'_, S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.storage.read_at(self.pos, buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}
