use std::io;

use thiserror::Error;

/// Errors raised by [`OffsetIndex`](crate::OffsetIndex).
///
/// `SizeOverflow`, `ResourceExhausted` and `Truncated` mean the table could
/// not be materialized. The batch stage that needed it cannot continue, but
/// deciding whether to abort is left to the caller.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("offset file {name} is {len} bytes, too large to address in memory")]
    SizeOverflow { name: String, len: u64 },

    #[error("insufficient memory for offset table {name} ({entries} entries)")]
    ResourceExhausted { name: String, entries: usize },

    #[error("offset file {name} is {len} bytes, not a multiple of the {entry_len}-byte entry")]
    Truncated {
        name: String,
        len: u64,
        entry_len: usize,
    },

    /// A single-valued table holds the same id more than once.
    #[error("duplicate id {id} in offset table {name}")]
    DuplicateKey { name: String, id: u64 },
}
