//! Packed `(way id, way kind)` values for node -> way side tables.

use byteorder::{ByteOrder, LittleEndian};
use offsets::IndexValue;

/// Bits of a raw way id that must be clear for it to be packable.
const HIGH_BITS: u64 = 0xC000_0000_0000_0000;

/// Largest way id a [`CompactLocation`] can hold (62 bits).
pub const MAX_WAY_ID: u64 = !HIGH_BITS;

/// Classification stored in the low two bits of a [`CompactLocation`].
///
/// Bit 0 distinguishes coastline from empty ways, bit 1 the traversal
/// direction relative to the node the entry is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum WayKind {
    CoastlineForward = 0,
    EmptyForward = 1,
    CoastlineBackward = 2,
    EmptyBackward = 3,
}

impl WayKind {
    pub const ALL: [WayKind; 4] = [
        WayKind::CoastlineForward,
        WayKind::EmptyForward,
        WayKind::CoastlineBackward,
        WayKind::EmptyBackward,
    ];

    fn from_bits(bits: u64) -> Self {
        match bits & 3 {
            0 => WayKind::CoastlineForward,
            1 => WayKind::EmptyForward,
            2 => WayKind::CoastlineBackward,
            _ => WayKind::EmptyBackward,
        }
    }

    #[must_use]
    pub fn is_coastline(self) -> bool {
        matches!(self, WayKind::CoastlineForward | WayKind::CoastlineBackward)
    }

    #[must_use]
    pub fn is_backward(self) -> bool {
        matches!(self, WayKind::CoastlineBackward | WayKind::EmptyBackward)
    }
}

/// A way id and a [`WayKind`] packed into one word: `(way_id << 2) | kind`.
///
/// Ordering is the integer order of the packed word, i.e. by way id first
/// and kind second.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct CompactLocation(u64);

impl CompactLocation {
    /// Packs `way_id` and `kind`.
    ///
    /// # Panics
    ///
    /// If `way_id` does not fit in 62 bits. Upstream ids never get that
    /// large, so hitting this is a bug in the caller.
    #[must_use]
    pub fn new(way_id: u64, kind: WayKind) -> Self {
        assert!(
            way_id & HIGH_BITS == 0,
            "way id {} does not fit in 62 bits",
            way_id
        );
        Self((way_id << 2) | kind as u64)
    }

    /// Like [`new`](Self::new) but returns `None` for an oversized id.
    #[must_use]
    pub fn try_new(way_id: u64, kind: WayKind) -> Option<Self> {
        (way_id & HIGH_BITS == 0).then(|| Self::new(way_id, kind))
    }

    #[must_use]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn way_id(self) -> u64 {
        self.0 >> 2
    }

    #[must_use]
    pub fn kind(self) -> WayKind {
        WayKind::from_bits(self.0)
    }
}

impl std::fmt::Debug for CompactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompactLocation")
            .field("way_id", &self.way_id())
            .field("kind", &self.kind())
            .finish()
    }
}

impl IndexValue for CompactLocation {
    const ENCODED_LEN: usize = 8;

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        Self(LittleEndian::read_u64(bytes))
    }
}
