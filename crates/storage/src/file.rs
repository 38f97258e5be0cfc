use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::Storage;

/// [`Storage`] backed by a file on disk.
///
/// Appends go through a `BufWriter`. A `read_at` flushes pending appends
/// first, so reads always observe everything appended so far. The OS file
/// cursor is moved back to the end lazily, on the next append.
pub struct FileStorage {
    path: PathBuf,
    file: BufWriter<File>,
    len: u64,
    /// Whether the OS cursor currently sits at end of file.
    at_end: bool,
    /// Set when an append failed part way. How many of its bytes reached
    /// the buffer or the file is unknown, so `len` can no longer be trusted.
    poisoned: bool,
}

impl FileStorage {
    /// Creates (or truncates) the file at `path` for appending.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .truncate(true)
            .open(&path)?;
        tracing::debug!(path = %path.display(), "created storage file");
        Ok(Self {
            path,
            file: BufWriter::new(file),
            len: 0,
            at_end: true,
            poisoned: false,
        })
    }

    /// Opens an existing file read-only. Appends will fail.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let len = file.metadata()?.len();
        tracing::debug!(path = %path.display(), len, "opened storage file");
        Ok(Self {
            path,
            file: BufWriter::new(file),
            len,
            at_end: len == 0,
            poisoned: false,
        })
    }

    /// Path of the underlying file (kept for diagnostics).
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for FileStorage {
    fn append(&mut self, bytes: &[u8]) -> io::Result<u64> {
        if self.poisoned {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{}: an earlier append failed", self.path.display()),
            ));
        }
        if !self.at_end {
            // read_at always flushes, so the write buffer is empty here
            self.file.get_mut().seek(SeekFrom::End(0))?;
            self.at_end = true;
        }
        if let Err(e) = self.file.write_all(bytes) {
            self.poisoned = true;
            return Err(e);
        }
        let offset = self.len;
        self.len += bytes.len() as u64;
        Ok(offset)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if offset >= self.len || buf.is_empty() {
            return Ok(0);
        }
        self.file.flush()?;
        let f = self.file.get_mut();
        f.seek(SeekFrom::Start(offset))?;
        self.at_end = false;

        let remaining = self.len - offset;
        let max = (buf.len() as u64).min(remaining) as usize;
        f.read(&mut buf[..max])
    }

    fn len(&self) -> u64 {
        self.len
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.flush()?;
        self.file.get_ref().sync_all()
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.path)
            .field("len", &self.len)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
