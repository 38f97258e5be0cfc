use byteorder::{ByteOrder, LittleEndian};

/// A fixed-size, totally ordered value stored next to an id.
///
/// `encode` must append exactly `ENCODED_LEN` bytes and `decode` receives
/// exactly that many.
pub trait IndexValue: Copy + Ord + std::fmt::Debug {
    const ENCODED_LEN: usize;

    fn encode(&self, buf: &mut Vec<u8>);
    fn decode(bytes: &[u8]) -> Self;
}

impl IndexValue for u64 {
    const ENCODED_LEN: usize = 8;

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        LittleEndian::read_u64(bytes)
    }
}

/// One `(id, value)` pair.
///
/// Field order gives the derived `Ord` its meaning: entries sort by id
/// first, then by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entry<V> {
    pub id: u64,
    pub value: V,
}

impl<V: IndexValue> Entry<V> {
    /// Size of one entry in an offset file.
    pub const ENCODED_LEN: usize = 8 + V::ENCODED_LEN;

    pub fn new(id: u64, value: V) -> Self {
        Self { id, value }
    }

    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.id.to_le_bytes());
        self.value.encode(buf);
    }

    pub(crate) fn decode(bytes: &[u8]) -> Self {
        Self {
            id: LittleEndian::read_u64(&bytes[..8]),
            value: V::decode(&bytes[8..Self::ENCODED_LEN]),
        }
    }
}
