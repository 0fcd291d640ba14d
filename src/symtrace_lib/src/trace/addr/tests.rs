use super::*;

#[test]
fn irrelevant_flag_is_uninteresting() {
    let mut addr = AddrEntry::new(AddrKind::MAddr, 0x1000);
    addr.flag = AddrFlag::Irrelevant;
    assert!(addr.is_uninteresting());
}

#[test]
fn greg_beyond_tracked_file_is_uninteresting() {
    let addr = AddrEntry::new(AddrKind::GReg, 16);
    assert!(addr.is_uninteresting());
    let addr = AddrEntry::new(AddrKind::GReg, 15);
    assert!(!addr.is_uninteresting());
}

#[test]
fn ordinary_memory_address_is_interesting() {
    let addr = AddrEntry::new(AddrKind::MAddr, 0x401000);
    assert!(!addr.is_uninteresting());
}

#[test]
fn flag_decodes_signed_minus_one_as_irrelevant() {
    assert_eq!(AddrFlag::from_wire(-1).unwrap(), AddrFlag::Irrelevant);
    assert_eq!(AddrFlag::from_wire(0).unwrap(), AddrFlag::None);
    assert!(AddrFlag::from_wire(42).is_err());
}

#[test]
fn kind_rejects_unknown_tag() {
    assert!(AddrKind::from_wire(9).is_err());
}

#[test]
fn pretty_prints_memory_address_as_hex() {
    let addr = AddrEntry::new(AddrKind::MAddr, 0x401000);
    assert_eq!(addr.pretty(), "0x00401000");
}
