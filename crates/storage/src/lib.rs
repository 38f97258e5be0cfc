//! # Storage - append-only byte storage and record streams
//!
//! The lowest layer of the cache. Everything above it is written against
//! the [`Storage`] capability: append bytes at the end and get back the
//! offset they landed at, or read bytes back from an offset.
//!
//! Two implementations are provided:
//!
//! - [`FileStorage`] - a real file, buffered on the write side.
//! - [`MemStorage`] - a growable byte vector, used by tests and by callers
//!   that want to build a cache fully in memory.
//!
//! [`RecordStream`] layers typed records (anything implementing [`Record`])
//! on top of a storage. Records are concatenated with no framing, so a
//! record can only be read back from an offset the caller already knows.
//!
//! ## Example
//!
//! ```rust,no_run
//! use storage::{MemStorage, RecordStream};
//!
//! let mut s = RecordStream::new(MemStorage::new());
//! let at = s.write(&"hello".to_string()).unwrap();
//! let back: String = s.read_at(at).unwrap();
//! assert_eq!(back, "hello");
//! ```

mod file;
mod mem;
mod record;
mod stream;

pub use file::FileStorage;
pub use mem::MemStorage;
pub use record::{read_len_prefixed, write_len_prefixed, Record, MAX_FIELD_BYTES};
pub use stream::RecordStream;

use std::io;

/// Append/read-at capability shared by data files and offset files.
///
/// Offsets are absolute byte positions from the start of the storage.
/// Appends always go to the end; nothing is ever overwritten.
pub trait Storage {
    /// Appends `bytes` at the end and returns the offset of their first byte.
    fn append(&mut self, bytes: &[u8]) -> io::Result<u64>;

    /// Reads up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns `Ok(0)` at or past the end.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Current size in bytes, including appends not yet synced.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes buffered appends down to the medium.
    fn sync(&mut self) -> io::Result<()>;

    /// Fills `buf` completely from `offset`, failing with `UnexpectedEof`
    /// if the storage ends first.
    fn read_exact_at(&mut self, mut offset: u64, mut buf: &mut [u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.read_at(offset, buf) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "storage ended before buffer was filled",
                    ))
                }
                Ok(n) => {
                    buf = &mut std::mem::take(&mut buf)[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
