//! Reverse lookup from nodes and ways to the relations that contain them.
//!
//! Built during the single pass over relations: every node or way member
//! produces one `(member id, relation id)` entry. A member shared by many
//! relations simply has many entries under the same id, which the sorted
//! table keeps contiguous.

use std::path::Path;

use offsets::OffsetIndex;
use storage::{FileStorage, Storage};

use crate::{CacheError, Member, MemberKind};

/// Node -> relations and way -> relations tables.
pub struct RelationIndex<S: Storage = FileStorage> {
    nodes: OffsetIndex<u64, S>,
    ways: OffsetIndex<u64, S>,
}

impl RelationIndex<FileStorage> {
    /// Creates (or truncates) both tables for a write pass.
    pub fn create<P1: AsRef<Path>, P2: AsRef<Path>>(
        nodes_path: P1,
        ways_path: P2,
    ) -> Result<Self, CacheError> {
        Ok(Self::from_parts(
            OffsetIndex::create(nodes_path)?,
            OffsetIndex::create(ways_path)?,
        ))
    }

    /// Opens both tables for a read pass. Call [`load`](Self::load) next.
    pub fn open<P1: AsRef<Path>, P2: AsRef<Path>>(
        nodes_path: P1,
        ways_path: P2,
    ) -> Result<Self, CacheError> {
        Ok(Self::from_parts(
            OffsetIndex::open(nodes_path)?,
            OffsetIndex::open(ways_path)?,
        ))
    }
}

impl<S: Storage> RelationIndex<S> {
    pub fn from_parts(nodes: OffsetIndex<u64, S>, ways: OffsetIndex<u64, S>) -> Self {
        Self { nodes, ways }
    }

    #[must_use]
    pub fn with_flush_threshold(mut self, entries: usize) -> Self {
        self.nodes = self.nodes.with_flush_threshold(entries);
        self.ways = self.ways.with_flush_threshold(entries);
        self
    }

    /// Indexes every node and way member of `relation_id`.
    ///
    /// Relation members are not indexed.
    pub fn add_relation(&mut self, relation_id: u64, members: &[Member]) -> Result<(), CacheError> {
        for m in members {
            match m.kind {
                MemberKind::Node => self.nodes.write(m.id, relation_id)?,
                MemberKind::Way => self.ways.write(m.id, relation_id)?,
                MemberKind::Relation => {}
            }
        }
        Ok(())
    }

    /// Flushes and syncs both tables. Ends the write pass.
    pub fn save(&mut self) -> Result<(), CacheError> {
        self.nodes.flush_to_file()?;
        self.nodes.sync()?;
        self.ways.flush_to_file()?;
        self.ways.sync()?;
        Ok(())
    }

    /// Loads and sorts both tables. Starts the read pass.
    pub fn load(&mut self) -> Result<(), CacheError> {
        self.nodes.load_into_memory()?;
        self.ways.load_into_memory()?;
        Ok(())
    }

    /// Visits the relations containing node `id`, ascending by relation id,
    /// until `visit` returns `true`.
    pub fn for_each_relation_of_node<F>(&self, id: u64, visit: F) -> bool
    where
        F: FnMut(u64) -> bool,
    {
        Self::visit(&self.nodes, id, visit)
    }

    /// Visits the relations containing way `id`, ascending by relation id,
    /// until `visit` returns `true`.
    pub fn for_each_relation_of_way<F>(&self, id: u64, visit: F) -> bool
    where
        F: FnMut(u64) -> bool,
    {
        Self::visit(&self.ways, id, visit)
    }

    pub fn relations_of_node(&self, id: u64) -> Vec<u64> {
        self.nodes.equal_range(id).iter().map(|e| e.value).collect()
    }

    pub fn relations_of_way(&self, id: u64) -> Vec<u64> {
        self.ways.equal_range(id).iter().map(|e| e.value).collect()
    }

    /// Loaded `(node links, way links)` counts.
    #[must_use]
    pub fn link_counts(&self) -> (usize, usize) {
        (self.nodes.len(), self.ways.len())
    }

    pub fn node_storage(&self) -> &S {
        self.nodes.storage()
    }

    pub fn way_storage(&self) -> &S {
        self.ways.storage()
    }

    fn visit<F>(index: &OffsetIndex<u64, S>, id: u64, mut visit: F) -> bool
    where
        F: FnMut(u64) -> bool,
    {
        index.for_each_match(id, |rel| visit(*rel))
    }
}
