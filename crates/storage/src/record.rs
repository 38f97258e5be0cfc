//! Serialization contract for values stored in a data file.
//!
//! A record must be self-delimiting: `decode` has to know where the record
//! ends without any outer framing, because data files are a bare
//! concatenation of encoded records.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Largest length-prefixed field we'll allocate during decode (64 MiB).
/// Prevents OOM on corrupt files.
pub const MAX_FIELD_BYTES: usize = 64 * 1024 * 1024;

/// A value that can be appended to and read back from a [`RecordStream`].
///
/// [`RecordStream`]: crate::RecordStream
pub trait Record: Sized {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()>;
    fn decode<R: Read>(r: &mut R) -> io::Result<Self>;
}

/// Writes `[len: u32 LE][bytes]`.
pub fn write_len_prefixed<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    let len = u32::try_from(bytes.len()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "field too large (exceeds u32::MAX bytes)",
        )
    })?;
    w.write_u32::<LittleEndian>(len)?;
    w.write_all(bytes)
}

/// Reads a field written by [`write_len_prefixed`].
pub fn read_len_prefixed<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let len = r.read_u32::<LittleEndian>()? as usize;
    if len > MAX_FIELD_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("field length {} exceeds maximum {}", len, MAX_FIELD_BYTES),
        ));
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

impl Record for u64 {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(*self)
    }

    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        r.read_u64::<LittleEndian>()
    }
}

impl Record for Vec<u8> {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_len_prefixed(w, self)
    }

    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        read_len_prefixed(r)
    }
}

impl Record for String {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_len_prefixed(w, self.as_bytes())
    }

    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        String::from_utf8(read_len_prefixed(r)?)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
