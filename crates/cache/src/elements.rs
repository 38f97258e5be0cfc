//! Way and relation records as stored in the cache data files.
//!
//! ## Encoding
//!
//! ```text
//! WayRecord:      [count: u32][node_id: u64] * count
//! RelationRecord: [count: u32][kind: u8][id: u64][role_len: u32][role] * count
//!                 [tag_count: u32][key_len: u32][key][val_len: u32][val] * tag_count
//! ```
//!
//! All integers are little-endian.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use storage::{read_len_prefixed, write_len_prefixed, Record};

/// Cap on pre-allocation from a decoded count, so a corrupt count cannot OOM.
const MAX_PREALLOC: usize = 4096;

/// What a relation member points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Node,
    Way,
    Relation,
}

impl MemberKind {
    fn code(self) -> u8 {
        match self {
            MemberKind::Node => 0,
            MemberKind::Way => 1,
            MemberKind::Relation => 2,
        }
    }

    fn from_code(code: u8) -> io::Result<Self> {
        match code {
            0 => Ok(MemberKind::Node),
            1 => Ok(MemberKind::Way),
            2 => Ok(MemberKind::Relation),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown member kind {}", other),
            )),
        }
    }
}

/// One member reference inside a relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub kind: MemberKind,
    pub id: u64,
    pub role: String,
}

impl Member {
    pub fn new(kind: MemberKind, id: u64, role: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            role: role.into(),
        }
    }
}

/// A way: the ordered list of its node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WayRecord {
    pub nodes: Vec<u64>,
}

impl WayRecord {
    pub fn new(nodes: Vec<u64>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn first_node(&self) -> Option<u64> {
        self.nodes.first().copied()
    }

    #[must_use]
    pub fn last_node(&self) -> Option<u64> {
        self.nodes.last().copied()
    }

    /// A way is closed when it has at least one segment and ends where it starts.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.nodes.len() > 1 && self.first_node() == self.last_node()
    }
}

/// A relation: its members and tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationRecord {
    pub members: Vec<Member>,
    pub tags: Vec<(String, String)>,
}

impl RelationRecord {
    /// Value of the first tag named `key`.
    #[must_use]
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Ids of all members of the given kind, in member order.
    pub fn member_ids(&self, kind: MemberKind) -> impl Iterator<Item = u64> + '_ {
        self.members
            .iter()
            .filter(move |m| m.kind == kind)
            .map(|m| m.id)
    }
}

fn write_count<W: Write>(w: &mut W, n: usize) -> io::Result<()> {
    let n = u32::try_from(n).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many items in record")
    })?;
    w.write_u32::<LittleEndian>(n)
}

fn read_string<R: Read>(r: &mut R) -> io::Result<String> {
    String::from_utf8(read_len_prefixed(r)?)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

impl Record for WayRecord {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_count(w, self.nodes.len())?;
        for id in &self.nodes {
            w.write_u64::<LittleEndian>(*id)?;
        }
        Ok(())
    }

    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let count = r.read_u32::<LittleEndian>()? as usize;
        let mut nodes = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            nodes.push(r.read_u64::<LittleEndian>()?);
        }
        Ok(Self { nodes })
    }
}

impl Record for RelationRecord {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_count(w, self.members.len())?;
        for m in &self.members {
            w.write_u8(m.kind.code())?;
            w.write_u64::<LittleEndian>(m.id)?;
            write_len_prefixed(w, m.role.as_bytes())?;
        }
        write_count(w, self.tags.len())?;
        for (k, v) in &self.tags {
            write_len_prefixed(w, k.as_bytes())?;
            write_len_prefixed(w, v.as_bytes())?;
        }
        Ok(())
    }

    fn decode<R: Read>(r: &mut R) -> io::Result<Self> {
        let count = r.read_u32::<LittleEndian>()? as usize;
        let mut members = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            let kind = MemberKind::from_code(r.read_u8()?)?;
            let id = r.read_u64::<LittleEndian>()?;
            let role = read_string(r)?;
            members.push(Member { kind, id, role });
        }

        let tag_count = r.read_u32::<LittleEndian>()? as usize;
        let mut tags = Vec::with_capacity(tag_count.min(MAX_PREALLOC));
        for _ in 0..tag_count {
            let k = read_string(r)?;
            let v = read_string(r)?;
            tags.push((k, v));
        }
        Ok(Self { members, tags })
    }
}
