
use crate::OffsetIndex;
use storage::MemStorage;

/// Reopens whatever `idx` has flushed so far as a fresh, loaded reader.
pub(crate) fn reload(idx: &OffsetIndex<u64, MemStorage>) -> OffsetIndex<u64, MemStorage> {
    let bytes = idx.storage().as_bytes().to_vec();
    let mut r = OffsetIndex::new(MemStorage::from_bytes(bytes), "reload");
    r.load_into_memory().expect("in-memory load cannot fail");
    r
}
