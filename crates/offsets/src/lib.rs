//! # Offsets - identifier -> location tables
//!
//! An [`OffsetIndex`] maps a 64-bit identifier to a fixed-size location
//! value (a byte offset into a data file, or a packed way reference). It is
//! built for a batch pipeline: write everything once, then load and query
//! many times.
//!
//! ## Write side
//!
//! Entries are appended to an in-memory buffer in arrival order. Once the
//! buffer holds more than `flush_threshold` entries (1024 by default) it is
//! spilled verbatim to the backing file. Nothing is sorted while writing,
//! so peak memory stays bounded regardless of data-set size. The caller
//! must [`flush_to_file`](OffsetIndex::flush_to_file) once at the end of
//! the pass or the tail of the buffer is lost.
//!
//! ## Read side
//!
//! [`load_into_memory`](OffsetIndex::load_into_memory) reads the whole file
//! and sorts it once by `(id, value)`. Lookups are binary searches after
//! that. Equal ids are contiguous and ordered by value, so duplicate keys
//! can be enumerated with [`equal_range`](OffsetIndex::equal_range).
//!
//! ## File format
//!
//! ```text
//! [id: u64 LE][value: V::ENCODED_LEN bytes LE] ... repeated, no header
//! ```
//!
//! Entries appear in flush order, **not** sorted. Any reader of the format
//! must sort after loading.

mod entry;
mod error;
mod index;

pub use entry::{Entry, IndexValue};
pub use error::IndexError;
pub use index::OffsetIndex;

/// Buffered entries above which the write buffer is spilled to disk.
pub use config::DEFAULT_FLUSH_THRESHOLD;

#[cfg(test)]
mod tests;
