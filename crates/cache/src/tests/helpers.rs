use crate::{KeyedReader, KeyedWriter, RelationIndex};
use offsets::OffsetIndex;
use storage::{MemStorage, Record, RecordStream};

pub fn mem_writer<T: Record>(threshold: usize) -> KeyedWriter<T, MemStorage> {
    KeyedWriter::from_parts(
        RecordStream::new(MemStorage::new()),
        OffsetIndex::new(MemStorage::new(), "mem.dat.offs"),
    )
    .with_flush_threshold(threshold)
}

/// Opens a fresh reader over everything `w` has written so far.
pub fn reader_from<T: Record>(w: &KeyedWriter<T, MemStorage>) -> KeyedReader<T, MemStorage> {
    KeyedReader::from_parts(
        RecordStream::new(w.data_storage().clone()),
        OffsetIndex::new(w.offsets_storage().clone(), "mem.dat.offs"),
    )
}

pub fn mem_relation_index(threshold: usize) -> RelationIndex<MemStorage> {
    RelationIndex::from_parts(
        OffsetIndex::new(MemStorage::new(), "nodes.id2rel"),
        OffsetIndex::new(MemStorage::new(), "ways.id2rel"),
    )
    .with_flush_threshold(threshold)
}

pub fn reopen_relation_index(idx: &RelationIndex<MemStorage>) -> RelationIndex<MemStorage> {
    RelationIndex::from_parts(
        OffsetIndex::new(idx.node_storage().clone(), "nodes.id2rel"),
        OffsetIndex::new(idx.way_storage().clone(), "ways.id2rel"),
    )
}
