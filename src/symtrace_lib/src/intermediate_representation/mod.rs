//! The static intermediate representation: expression algebra (component A)
//! plus the function/basic-block/instruction container (the in-scope
//! stand-in for "the IR parser", see SPEC_FULL.md §6).

pub mod expression;
pub mod term;
pub mod types;

pub use expression::{BinOp, CastOp, Expr, ICmpPredicate};
pub use term::{
    BasicBlock, ConstValue, ExternalFunctionDecl, Function, Instruction, InstructionKind,
    IrModule, Operand, Tid,
};
pub use types::{ByteSize, ExprT};
