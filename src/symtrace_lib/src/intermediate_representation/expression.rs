//! The expression algebra (component A): a closed set of typed expression
//! nodes plus a canonical, bottom-up simplifier.
//!
//! Expressions are plain, immutable value objects with structural equality;
//! there is no visitor trait hierarchy, matching the way the teacher
//! represents its own IR `Expression`/`Def`/`Jmp` types as plain enums with
//! a handful of inherent recursive-rewrite methods rather than a trait
//! object graph.

use crate::intermediate_representation::ExprT;
use crate::prelude::*;
use crate::trace::{AddrEntry, Loc};

/// A binary arithmetic or bitwise operation.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[allow(missing_docs)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Lshr,
    Ashr,
    And,
    Or,
    Xor,
}

/// A unary cast operation.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[allow(missing_docs)]
pub enum CastOp {
    Trunc,
    ZExt,
    SExt,
    FPTrunc,
    FPExt,
    FPToSI,
    FPToUI,
    SIToFP,
    UIToFP,
    PtrToInt,
    IntToPtr,
    Bitcast,
}

/// An integer comparison predicate.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[allow(missing_docs)]
pub enum ICmpPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

/// An immutable algebraic expression tree.
///
/// Integer literals are stored as `i128` rather than a fixed machine width:
/// wide enough to hold any literal this analyzer deals with (8/32/64-bit
/// guest integers) without the portability risk of depending on an
/// arbitrary-precision bignum type whose exact API this crate would
/// otherwise have to guess at (see DESIGN.md for the apint-vs-i128
/// trade-off).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum Expr {
    /// A binary arithmetic/logic operation.
    Binary {
        op: BinOp,
        ty: ExprT,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A unary cast.
    Cast { op: CastOp, ty: ExprT, arg: Box<Expr> },
    /// A struct value built out of field expressions.
    Struct { ty: ExprT, fields: Vec<Expr> },
    /// One field extracted out of an aggregate.
    Extract {
        ty: ExprT,
        index: u32,
        aggregate: Box<Expr>,
    },
    /// An integer comparison.
    ICmp {
        predicate: ICmpPredicate,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// A call to an intrinsic function.
    Intrinsic {
        name: String,
        ty: ExprT,
        args: Vec<Expr>,
    },
    /// The value read by a `Load`, together with the address it came from
    /// and a stable free-variable name if the location had no prior value.
    Load {
        ty: ExprT,
        address: AddrEntry,
        name: Option<String>,
    },
    /// An integer literal.
    ILit(i128),
    /// A floating point literal.
    FLit(f64),
    /// A free variable standing for an as-yet-unknown location.
    Input { ty: ExprT, loc: Loc },
    /// An opaque placeholder for a pointer computation (`GetElementPtr`).
    Gep,
    /// The neutral placeholder used when inserting into a freshly
    /// constructed aggregate; never produced by arithmetic.
    Undefined,
    /// The "don't care" bottom: a zero element that propagates through any
    /// arithmetic/cast built on top of it.
    Irrelevant,
}

impl Expr {
    /// `true` for the `Irrelevant` bottom.
    pub fn is_irrelevant(&self) -> bool {
        matches!(self, Expr::Irrelevant)
    }

    /// Strip one outer `IntToPtr` cast, if present. Used to compute the
    /// `origin` expression attached to `Memory` messages (§4.4): the address
    /// value "with its outer `IntToPtr` cast stripped, if buildable".
    pub fn strip_outer_int_to_ptr(self) -> Expr {
        match self {
            Expr::Cast {
                op: CastOp::IntToPtr,
                arg,
                ..
            } => *arg,
            other => other,
        }
    }
}

/// Apply the fixed simplification ruleset of the full spec's component A
/// bottom-up, retrying until a fixed point is reached or five passes have
/// been spent, whichever comes first. No rule ever increases tree size, so
/// giving up after five passes just means returning the best-effort
/// (still correct, just not maximally simplified) expression built so far.
pub fn simplify(expr: Expr) -> Expr {
    let mut current = expr;
    for _ in 0..5 {
        let next = simplify_once(current.clone());
        if next == current {
            return next;
        }
        current = next;
    }
    current
}

fn simplify_once(expr: Expr) -> Expr {
    match expr {
        Expr::Binary { op, ty, lhs, rhs } => {
            let lhs = simplify_once(*lhs);
            let rhs = simplify_once(*rhs);
            if lhs.is_irrelevant() || rhs.is_irrelevant() {
                return Expr::Irrelevant;
            }
            apply_binary_rules(op, ty, lhs, rhs)
        }
        Expr::Cast { op, ty, arg } => {
            let arg = simplify_once(*arg);
            if arg.is_irrelevant() {
                return Expr::Irrelevant;
            }
            apply_cast_rules(op, ty, arg)
        }
        Expr::Struct { ty, fields } => Expr::Struct {
            ty,
            fields: fields.into_iter().map(simplify_once).collect(),
        },
        Expr::Extract {
            ty,
            index,
            aggregate,
        } => {
            let aggregate = simplify_once(*aggregate);
            if aggregate.is_irrelevant() {
                return Expr::Irrelevant;
            }
            Expr::Extract {
                ty,
                index,
                aggregate: Box::new(aggregate),
            }
        }
        Expr::ICmp {
            predicate,
            lhs,
            rhs,
        } => {
            let lhs = simplify_once(*lhs);
            let rhs = simplify_once(*rhs);
            if lhs.is_irrelevant() || rhs.is_irrelevant() {
                return Expr::Irrelevant;
            }
            Expr::ICmp {
                predicate,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            }
        }
        Expr::Intrinsic { name, ty, args } => {
            let args: Vec<Expr> = args.into_iter().map(simplify_once).collect();
            if args.iter().any(Expr::is_irrelevant) {
                return Expr::Irrelevant;
            }
            Expr::Intrinsic { name, ty, args }
        }
        // Load, ILit, FLit, Input, Gep, Undefined, Irrelevant are leaves.
        other => other,
    }
}

fn apply_binary_rules(op: BinOp, ty: ExprT, lhs: Expr, rhs: Expr) -> Expr {
    match op {
        BinOp::Add => {
            if is_zero_lit(&rhs) {
                return lhs;
            }
            if is_zero_lit(&lhs) {
                return rhs;
            }
        }
        BinOp::Ashr => {
            if is_zero_lit(&lhs) {
                return Expr::ILit(0);
            }
        }
        _ => {}
    }
    Expr::Binary {
        op,
        ty,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn is_zero_lit(expr: &Expr) -> bool {
    matches!(expr, Expr::ILit(0))
}

fn apply_cast_rules(op: CastOp, ty: ExprT, arg: Expr) -> Expr {
    match op {
        CastOp::Trunc => {
            if let Expr::Cast {
                op: CastOp::ZExt | CastOp::SExt,
                arg: inner,
                ..
            } = arg
            {
                return *inner;
            }
            if let Expr::ILit(n) = arg {
                if let Some(bits) = ty.bit_width() {
                    if bits < 127 && n < (1i128 << bits) {
                        return Expr::ILit(n);
                    }
                }
                // `n` does not fit the target width: preserved, not
                // truncated numerically (see §8 boundary behavior).
                return Expr::Cast {
                    op: CastOp::Trunc,
                    ty,
                    arg: Box::new(Expr::ILit(n)),
                };
            }
        }
        CastOp::ZExt | CastOp::SExt => {
            if let Expr::ILit(_) | Expr::FLit(_) = arg {
                return arg;
            }
        }
        CastOp::PtrToInt => {
            if let Expr::Cast {
                op: CastOp::IntToPtr,
                arg: inner,
                ..
            } = arg
            {
                return *inner;
            }
        }
        CastOp::IntToPtr => {
            if ty == ExprT::Int64 {
                if let Expr::Cast {
                    op: CastOp::PtrToInt,
                    arg: inner,
                    ..
                } = arg
                {
                    return *inner;
                }
            }
        }
        _ => {}
    }
    Expr::Cast {
        op,
        ty,
        arg: Box::new(arg),
    }
}

#[cfg(test)]
mod tests;
