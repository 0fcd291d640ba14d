use super::*;
use crate::trace::{AddrEntry, AddrKind};

fn lit(n: i128) -> Expr {
    Expr::ILit(n)
}

fn input(ty: ExprT, name: &str) -> Expr {
    Expr::Input {
        ty,
        loc: Loc::id("f", name),
    }
}

#[test]
fn add_zero_on_either_side_disappears() {
    let a = input(ExprT::Int32, "a");
    let expr = Expr::Binary {
        op: BinOp::Add,
        ty: ExprT::Int32,
        lhs: Box::new(a.clone()),
        rhs: Box::new(lit(0)),
    };
    assert_eq!(simplify(expr), a.clone());

    let expr = Expr::Binary {
        op: BinOp::Add,
        ty: ExprT::Int32,
        lhs: Box::new(lit(0)),
        rhs: Box::new(a.clone()),
    };
    assert_eq!(simplify(expr), a);
}

#[test]
fn ashr_of_zero_is_zero() {
    let expr = Expr::Binary {
        op: BinOp::Ashr,
        ty: ExprT::Int32,
        lhs: Box::new(lit(0)),
        rhs: Box::new(input(ExprT::Int32, "shift")),
    };
    assert_eq!(simplify(expr), lit(0));
}

#[test]
fn trunc_of_zext_cancels() {
    let a = input(ExprT::Int8, "a");
    let expr = Expr::Cast {
        op: CastOp::Trunc,
        ty: ExprT::Int8,
        arg: Box::new(Expr::Cast {
            op: CastOp::ZExt,
            ty: ExprT::Int32,
            arg: Box::new(a.clone()),
        }),
    };
    assert_eq!(simplify(expr), a);
}

#[test]
fn trunc_of_sext_cancels() {
    let a = input(ExprT::Int8, "a");
    let expr = Expr::Cast {
        op: CastOp::Trunc,
        ty: ExprT::Int8,
        arg: Box::new(Expr::Cast {
            op: CastOp::SExt,
            ty: ExprT::Int32,
            arg: Box::new(a.clone()),
        }),
    };
    assert_eq!(simplify(expr), a);
}

#[test]
fn trunc_of_small_literal_drops_the_cast() {
    let expr = Expr::Cast {
        op: CastOp::Trunc,
        ty: ExprT::Int8,
        arg: Box::new(lit(10)),
    };
    assert_eq!(simplify(expr), lit(10));
}

#[test]
fn trunc_of_oversized_literal_is_preserved_not_truncated() {
    // 300 does not fit in 8 bits; the simplifier must not silently wrap it.
    let expr = Expr::Cast {
        op: CastOp::Trunc,
        ty: ExprT::Int8,
        arg: Box::new(lit(300)),
    };
    assert_eq!(
        simplify(expr),
        Expr::Cast {
            op: CastOp::Trunc,
            ty: ExprT::Int8,
            arg: Box::new(lit(300)),
        }
    );
}

#[test]
fn zext_and_sext_of_literal_drop_the_cast() {
    assert_eq!(
        simplify(Expr::Cast {
            op: CastOp::ZExt,
            ty: ExprT::Int32,
            arg: Box::new(lit(5)),
        }),
        lit(5)
    );
    assert_eq!(
        simplify(Expr::Cast {
            op: CastOp::SExt,
            ty: ExprT::Int32,
            arg: Box::new(lit(5)),
        }),
        lit(5)
    );
}

#[test]
fn ptr_to_int_of_int_to_ptr_cancels() {
    let a = input(ExprT::Int64, "a");
    let expr = Expr::Cast {
        op: CastOp::PtrToInt,
        ty: ExprT::Int64,
        arg: Box::new(Expr::Cast {
            op: CastOp::IntToPtr,
            ty: ExprT::Ptr,
            arg: Box::new(a.clone()),
        }),
    };
    assert_eq!(simplify(expr), a);
}

#[test]
fn int_to_ptr_of_ptr_to_int_cancels_only_at_int64() {
    let a = input(ExprT::Ptr, "a");
    let expr = Expr::Cast {
        op: CastOp::IntToPtr,
        ty: ExprT::Int64,
        arg: Box::new(Expr::Cast {
            op: CastOp::PtrToInt,
            ty: ExprT::Int64,
            arg: Box::new(a.clone()),
        }),
    };
    assert_eq!(simplify(expr), a);

    // At Int32 the round-trip is NOT eliminated.
    let expr_32 = Expr::Cast {
        op: CastOp::IntToPtr,
        ty: ExprT::Int32,
        arg: Box::new(Expr::Cast {
            op: CastOp::PtrToInt,
            ty: ExprT::Int64,
            arg: Box::new(a.clone()),
        }),
    };
    assert_ne!(simplify(expr_32), a);
}

#[test]
fn irrelevant_operand_propagates_through_arithmetic() {
    let expr = Expr::Binary {
        op: BinOp::Mul,
        ty: ExprT::Int32,
        lhs: Box::new(Expr::Irrelevant),
        rhs: Box::new(lit(3)),
    };
    assert_eq!(simplify(expr), Expr::Irrelevant);
}

#[test]
fn irrelevant_operand_propagates_through_casts() {
    let expr = Expr::Cast {
        op: CastOp::Bitcast,
        ty: ExprT::Int32,
        arg: Box::new(Expr::Irrelevant),
    };
    assert_eq!(simplify(expr), Expr::Irrelevant);
}

#[test]
fn simplifying_a_simplified_expression_is_a_no_op() {
    let a = input(ExprT::Int32, "a");
    let once = simplify(Expr::Binary {
        op: BinOp::Add,
        ty: ExprT::Int32,
        lhs: Box::new(a.clone()),
        rhs: Box::new(lit(0)),
    });
    let twice = simplify(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn other_binops_simplify_children_and_rebuild() {
    let expr = Expr::Binary {
        op: BinOp::Xor,
        ty: ExprT::Int32,
        lhs: Box::new(Expr::Cast {
            op: CastOp::Trunc,
            ty: ExprT::Int8,
            arg: Box::new(Expr::Cast {
                op: CastOp::ZExt,
                ty: ExprT::Int32,
                arg: Box::new(input(ExprT::Int8, "a")),
            }),
        }),
        rhs: Box::new(lit(7)),
    };
    assert_eq!(
        simplify(expr),
        Expr::Binary {
            op: BinOp::Xor,
            ty: ExprT::Int32,
            lhs: Box::new(input(ExprT::Int8, "a")),
            rhs: Box::new(lit(7)),
        }
    );
}

#[test]
fn strip_outer_int_to_ptr_removes_only_the_outer_cast() {
    let a = input(ExprT::Int64, "a");
    let expr = Expr::Cast {
        op: CastOp::IntToPtr,
        ty: ExprT::Ptr,
        arg: Box::new(a.clone()),
    };
    assert_eq!(expr.strip_outer_int_to_ptr(), a);

    let no_cast = lit(5);
    assert_eq!(no_cast.clone().strip_outer_int_to_ptr(), no_cast);
}

#[test]
fn load_is_a_leaf_and_is_unaffected_by_simplification() {
    let addr = AddrEntry::new(AddrKind::MAddr, 0x1000);
    let expr = Expr::Load {
        ty: ExprT::Int32,
        address: addr,
        name: Some("Int32T_1000_0".to_string()),
    };
    assert_eq!(simplify(expr.clone()), expr);
}
