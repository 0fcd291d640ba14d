use super::*;
use crate::trace::AddrKind;

fn addr_record(op: u64, kind: u64, val: u64, off: u32, flag: i32) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&0u64.to_le_bytes());
    buf[8..16].copy_from_slice(&op.to_le_bytes());
    buf[16..24].copy_from_slice(&kind.to_le_bytes());
    buf[24..32].copy_from_slice(&val.to_le_bytes());
    buf[32..36].copy_from_slice(&off.to_le_bytes());
    buf[36..40].copy_from_slice(&flag.to_le_bytes());
    buf
}

fn branch_record(taken: u32) -> [u8; RECORD_SIZE] {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&1u64.to_le_bytes());
    buf[8..12].copy_from_slice(&taken.to_le_bytes());
    buf
}

#[test]
fn decodes_a_single_addr_record() {
    let buf = addr_record(0, 1, 0x401000, 0, 0);
    let events = read_memlog(&buf[..]).unwrap();
    assert_eq!(
        events,
        vec![RawEvent::Addr(
            AddrOp::Load,
            AddrEntry {
                kind: AddrKind::MAddr,
                value: 0x401000,
                offset: 0,
                flag: AddrFlag::None,
            }
        )]
    );
}

#[test]
fn decodes_a_sequence_of_mixed_records() {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&addr_record(1, 1, 0x2000, 0, 0));
    bytes.extend_from_slice(&branch_record(0));
    let events = read_memlog(&bytes[..]).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1], RawEvent::Branch(0));
}

#[test]
fn rejects_unknown_entry_type() {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0..8].copy_from_slice(&99u64.to_le_bytes());
    assert!(read_memlog(&buf[..]).is_err());
}

#[test]
fn rejects_truncated_record() {
    let buf = addr_record(0, 1, 0x1000, 0, 0);
    assert!(read_memlog(&buf[..30]).is_err());
}

#[test]
fn signed_flag_minus_one_round_trips() {
    let buf = addr_record(1, 1, 0x3000, 0, -1);
    let events = read_memlog(&buf[..]).unwrap();
    match &events[0] {
        RawEvent::Addr(_, entry) => assert_eq!(entry.flag, AddrFlag::Irrelevant),
        _ => panic!("expected Addr event"),
    }
}

#[test]
fn empty_input_yields_no_events() {
    let events = read_memlog(&[][..]).unwrap();
    assert!(events.is_empty());
}
