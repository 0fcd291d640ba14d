use super::*;

#[test]
fn addr_op_decodes_all_four_tags() {
    assert_eq!(AddrOp::from_wire(0).unwrap(), AddrOp::Load);
    assert_eq!(AddrOp::from_wire(1).unwrap(), AddrOp::Store);
    assert_eq!(AddrOp::from_wire(2).unwrap(), AddrOp::BranchAddr);
    assert_eq!(AddrOp::from_wire(3).unwrap(), AddrOp::SelectAddr);
    assert!(AddrOp::from_wire(4).is_err());
}

#[test]
fn warning_is_formatted_with_hex_ip() {
    assert_eq!(
        Message::format_warning(Some(0x1000), "oops"),
        " - (0x1000) oops"
    );
    assert_eq!(
        Message::format_warning(None, "oops"),
        " - (unknown) oops"
    );
}
