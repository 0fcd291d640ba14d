use super::*;
use crate::trace::AddrKind;

#[test]
fn id_locs_with_different_names_are_distinct() {
    let a = Loc::id("f", "x");
    let b = Loc::id("f", "y");
    assert_ne!(a, b);
}

#[test]
fn mem_loc_wraps_addr_entry() {
    let addr = AddrEntry::new(AddrKind::MAddr, 0x1000);
    let loc = Loc::mem(addr);
    assert_eq!(loc, Loc::MemLoc(addr));
}

#[test]
fn display_distinguishes_kinds() {
    assert_eq!(Loc::id("f", "x").to_string(), "f::%x");
}
