use crate::*;
use anyhow::Result;
use storage::{MemStorage, RecordStream};

fn sample_relation() -> RelationRecord {
    RelationRecord {
        members: vec![
            Member::new(MemberKind::Way, 10, "outer"),
            Member::new(MemberKind::Way, 11, "inner"),
            Member::new(MemberKind::Node, 3, "label"),
            Member::new(MemberKind::Relation, 500, ""),
        ],
        tags: vec![
            ("type".to_string(), "multipolygon".to_string()),
            ("name".to_string(), "Lake Ünterwasser".to_string()),
        ],
    }
}

#[test]
fn records_survive_the_stream() -> Result<()> {
    let mut s = RecordStream::new(MemStorage::new());
    let way = WayRecord::new(vec![1, 2, 3, 1]);
    let rel = sample_relation();
    let empty = RelationRecord::default();

    let at_way = s.write(&way)?;
    let at_rel = s.write(&rel)?;
    let at_empty = s.write(&empty)?;

    assert_eq!(s.read_at::<RelationRecord>(at_empty)?, empty);
    assert_eq!(s.read_at::<RelationRecord>(at_rel)?, rel);
    assert_eq!(s.read_at::<WayRecord>(at_way)?, way);
    Ok(())
}

#[test]
fn way_record_layout() -> Result<()> {
    let mut s = RecordStream::new(MemStorage::new());
    s.write(&WayRecord::new(vec![7, 8]))?;
    let bytes = s.storage().as_bytes();
    assert_eq!(bytes.len(), 4 + 2 * 8);
    assert_eq!(&bytes[..4], &2u32.to_le_bytes());
    assert_eq!(&bytes[4..12], &7u64.to_le_bytes());
    Ok(())
}

#[test]
fn unknown_member_kind_is_invalid_data() -> Result<()> {
    let mut s = RecordStream::new(MemStorage::new());
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.push(9);
    s.append(&bytes)?;
    let err = s.read_at::<RelationRecord>(0).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    Ok(())
}

#[test]
fn relation_helpers() {
    let rel = sample_relation();
    assert_eq!(rel.tag("type"), Some("multipolygon"));
    assert_eq!(rel.tag("missing"), None);
    assert_eq!(rel.member_ids(MemberKind::Way).collect::<Vec<_>>(), vec![10, 11]);
    assert_eq!(rel.member_ids(MemberKind::Node).collect::<Vec<_>>(), vec![3]);
}

#[test]
fn way_closure() {
    assert!(WayRecord::new(vec![1, 2, 3, 1]).is_closed());
    assert!(!WayRecord::new(vec![1, 2, 3]).is_closed());
    assert!(!WayRecord::new(vec![1]).is_closed());
    assert!(!WayRecord::default().is_closed());
    assert_eq!(WayRecord::new(vec![4, 5]).first_node(), Some(4));
    assert_eq!(WayRecord::new(vec![4, 5]).last_node(), Some(5));
}
