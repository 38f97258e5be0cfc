use std::io;

use offsets::IndexError;
use thiserror::Error;

/// Errors that can occur while writing or reading a cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// An underlying I/O error on a data file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// An offset table could not be written, loaded or validated.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A reader was queried before `load_offsets`.
    #[error("offsets of {0} were queried before being loaded")]
    OffsetsNotLoaded(String),
}
