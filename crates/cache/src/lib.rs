//! # Cache - keyed record stores for the indexing pipeline
//!
//! Ties the [`storage`] and [`offsets`] crates together into the on-disk
//! cache used between pipeline stages.
//!
//! ## Layout of one cache directory
//!
//! ```text
//! ways.dat            WayRecord, concatenated in write order
//! ways.dat.offs       way id      -> offset in ways.dat
//! relations.dat       RelationRecord, concatenated in write order
//! relations.dat.offs  relation id -> offset in relations.dat
//! nodes.dat.id2rel    node id     -> relation id   (duplicates allowed)
//! ways.dat.id2rel     way id      -> relation id   (duplicates allowed)
//! mapped_ways.n2w     node id     -> CompactLocation (way id + WayKind)
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                              |
//! |---------------|------------------------------------------------------|
//! | [`keyed`]     | `KeyedWriter` / `KeyedReader`: id -> record stores    |
//! | [`location`]  | `CompactLocation`, `WayKind`                          |
//! | [`relations`] | `RelationIndex`: node/way -> parent relations         |
//! | [`elements`]  | `WayRecord`, `RelationRecord`, `Member`               |
//! | [`holder`]    | `CacheWriter` / `CacheReader` for a whole directory   |
//!
//! Writers and readers are separate types: a store is written in one pass,
//! saved, and only then reopened for reading.

pub mod elements;
mod error;
pub mod holder;
pub mod keyed;
pub mod location;
pub mod relations;

pub use elements::{Member, MemberKind, RelationRecord, WayRecord};
pub use error::CacheError;
pub use holder::{CacheReader, CacheStats, CacheWriter};
pub use keyed::{KeyedReader, KeyedWriter};
pub use location::{CompactLocation, WayKind};
pub use relations::RelationIndex;

#[cfg(test)]
mod tests;
