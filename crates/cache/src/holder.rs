//! Directory-level composition of every store and side table.
//!
//! [`CacheWriter`] is filled during the ways/relations pass of the
//! pipeline; [`CacheReader`] is opened by the later stages that resolve
//! geometry and relation membership.

use config::CacheConfig;
use offsets::OffsetIndex;
use tracing::info;

use crate::{
    CacheError, CompactLocation, KeyedReader, KeyedWriter, MemberKind, RelationIndex,
    RelationRecord, WayRecord,
};

/// Write side of a cache directory.
pub struct CacheWriter {
    ways: KeyedWriter<WayRecord>,
    relations: KeyedWriter<RelationRecord>,
    relation_index: RelationIndex,
    mapped_ways: OffsetIndex<CompactLocation>,
}

impl CacheWriter {
    /// Creates the cache directory if needed and truncates every file in it.
    pub fn create(cfg: &CacheConfig) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&cfg.dir)?;
        let threshold = cfg.flush_threshold;

        let writer = Self {
            ways: KeyedWriter::create(cfg.ways_path())?.with_flush_threshold(threshold),
            relations: KeyedWriter::create(cfg.relations_path())?
                .with_flush_threshold(threshold),
            relation_index: RelationIndex::create(
                cfg.nodes_to_relations_path(),
                cfg.ways_to_relations_path(),
            )?
            .with_flush_threshold(threshold),
            mapped_ways: OffsetIndex::create(cfg.mapped_ways_path())?
                .with_flush_threshold(threshold),
        };
        info!(dir = %cfg.dir.display(), threshold, "cache writer created");
        Ok(writer)
    }

    pub fn add_way(&mut self, id: u64, way: &WayRecord) -> Result<(), CacheError> {
        self.ways.write(id, way)?;
        Ok(())
    }

    /// Stores the relation and indexes its node and way members.
    pub fn add_relation(&mut self, id: u64, relation: &RelationRecord) -> Result<(), CacheError> {
        self.relations.write(id, relation)?;
        self.relation_index.add_relation(id, &relation.members)?;
        Ok(())
    }

    /// Records that `node_id` is an endpoint of the way in `location`.
    pub fn add_mapped_way(&mut self, node_id: u64, location: CompactLocation) -> Result<(), CacheError> {
        self.mapped_ways.write(node_id, location)?;
        Ok(())
    }

    /// Flushes every table and syncs every file. Ends the write pass.
    pub fn finish(&mut self) -> Result<(), CacheError> {
        self.ways.save_offsets()?;
        self.relations.save_offsets()?;
        self.relation_index.save()?;
        self.mapped_ways.flush_to_file()?;
        self.mapped_ways.sync()?;
        info!(
            ways = self.ways.written(),
            relations = self.relations.written(),
            "cache write pass finished"
        );
        Ok(())
    }
}

/// Entry counts of a loaded cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub ways: usize,
    pub relations: usize,
    pub node_links: usize,
    pub way_links: usize,
    pub mapped_ways: usize,
}

/// Read side of a cache directory, with every table loaded.
pub struct CacheReader {
    ways: KeyedReader<WayRecord>,
    relations: KeyedReader<RelationRecord>,
    relation_index: RelationIndex,
    mapped_ways: OffsetIndex<CompactLocation>,
}

impl CacheReader {
    /// Opens every file of the cache and loads all offset tables.
    ///
    /// # Errors
    ///
    /// Fails if a file is missing, if a table cannot be materialized, or if
    /// the way or relation store holds a repeated id.
    pub fn open(cfg: &CacheConfig) -> Result<Self, CacheError> {
        let mut ways: KeyedReader<WayRecord> = KeyedReader::open(cfg.ways_path())?;
        ways.load_offsets()?;
        let mut relations: KeyedReader<RelationRecord> = KeyedReader::open(cfg.relations_path())?;
        relations.load_offsets()?;
        let mut relation_index =
            RelationIndex::open(cfg.nodes_to_relations_path(), cfg.ways_to_relations_path())?;
        relation_index.load()?;
        let mut mapped_ways: OffsetIndex<CompactLocation> = OffsetIndex::open(cfg.mapped_ways_path())?;
        mapped_ways.load_into_memory()?;

        let reader = Self {
            ways,
            relations,
            relation_index,
            mapped_ways,
        };
        let stats = reader.stats();
        info!(dir = %cfg.dir.display(), ?stats, "cache reader opened");
        Ok(reader)
    }

    pub fn read_way(&mut self, id: u64) -> Result<Option<WayRecord>, CacheError> {
        self.ways.read(id)
    }

    pub fn read_relation(&mut self, id: u64) -> Result<Option<RelationRecord>, CacheError> {
        self.relations.read(id)
    }

    pub fn for_each_relation_of_node<F>(&self, id: u64, visit: F) -> bool
    where
        F: FnMut(u64) -> bool,
    {
        self.relation_index.for_each_relation_of_node(id, visit)
    }

    pub fn for_each_relation_of_way<F>(&self, id: u64, visit: F) -> bool
    where
        F: FnMut(u64) -> bool,
    {
        self.relation_index.for_each_relation_of_way(id, visit)
    }

    /// Reads the relations that contain member `id` of `kind`, ascending by
    /// relation id, until `visit` returns `true`.
    ///
    /// A relation listing the member several times is visited once.
    /// Relation members are not indexed, so `MemberKind::Relation` visits
    /// nothing.
    pub fn for_each_parent_relation<F>(
        &mut self,
        kind: MemberKind,
        id: u64,
        mut visit: F,
    ) -> Result<bool, CacheError>
    where
        F: FnMut(u64, RelationRecord) -> bool,
    {
        let mut parents = match kind {
            MemberKind::Node => self.relation_index.relations_of_node(id),
            MemberKind::Way => self.relation_index.relations_of_way(id),
            MemberKind::Relation => Vec::new(),
        };
        parents.dedup();
        for rel_id in parents {
            if let Some(rel) = self.relations.read(rel_id)? {
                if visit(rel_id, rel) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Visits the ways that have `node_id` as an endpoint, ascending by
    /// way id then kind, until `visit` returns `true`.
    pub fn for_each_mapped_way<F>(&self, node_id: u64, mut visit: F) -> bool
    where
        F: FnMut(CompactLocation) -> bool,
    {
        self.mapped_ways.for_each_match(node_id, |loc| visit(*loc))
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let (node_links, way_links) = self.relation_index.link_counts();
        CacheStats {
            ways: self.ways.len(),
            relations: self.relations.len(),
            node_links,
            way_links,
            mapped_ways: self.mapped_ways.len(),
        }
    }
}
