//! The static intermediate representation (IR): functions, basic blocks and
//! instructions, plus the `Tid`/`Term` identification scheme used to name
//! every object in it.
//!
//! This is the in-scope stand-in for "the IR parser" named as an external
//! collaborator in the purpose statement: a concrete, serializable data
//! model the associator and evaluator can run against, and that tests can
//! construct from small JSON fixtures. It intentionally does not understand
//! any particular binary format (Ghidra P-Code, LLVM bitcode, ...); a real
//! front end would produce an `IrModule` and hand it to this crate.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::intermediate_representation::expression::{BinOp, CastOp, ICmpPredicate};
use crate::intermediate_representation::ExprT;
use crate::prelude::*;

/// A term identifier consisting of an ID string (required to be unique
/// within its kind) and, where known, the guest address the term
/// corresponds to.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
pub struct Tid {
    id: String,
    /// The guest address the term originated from, if any.
    pub address: Option<u64>,
}

impl Tid {
    /// A new `Tid` with the given ID string and no known address.
    pub fn new<T: ToString>(val: T) -> Tid {
        Tid {
            id: val.to_string(),
            address: None,
        }
    }

    /// A new `Tid` with an explicit guest address.
    pub fn with_address<T: ToString>(val: T, address: u64) -> Tid {
        Tid {
            id: val.to_string(),
            address: Some(address),
        }
    }

    /// Add a suffix to the ID string, producing a new, still-unique `Tid`.
    pub fn with_id_suffix(self, suffix: &str) -> Tid {
        Tid {
            id: self.id + suffix,
            address: self.address,
        }
    }
}

impl std::fmt::Display for Tid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// An operand of an instruction: either a reference to a previously computed
/// SSA value in the same function, or a constant.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum Operand {
    /// The SSA identifier of a value computed earlier in the same function.
    Value(String),
    /// A constant operand.
    Const(ConstValue),
}

/// A constant value, as introspectable per the external-interfaces contract:
/// integer, float, undef, or an inner instruction (a constant expression
/// such as a folded `GetElementPtr`).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum ConstValue {
    /// An integer constant. Stored as `i128` so both signed and unsigned
    /// 64-bit values round-trip without loss; the expression builder
    /// widens further into an arbitrary-precision literal (see
    /// `intermediate_representation::expression::Expr::ILit`).
    Int(i128),
    /// A floating point constant.
    Float(f64),
    /// The LLVM/P-Code `undef` value.
    Undef,
    /// A constant expression, represented as a nested instruction with no
    /// SSA name of its own (e.g. a folded address computation).
    Instruction(Box<InstructionKind>),
}

/// The kind-specific payload of an [`Instruction`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum InstructionKind {
    /// A binary arithmetic or logic operation.
    BinaryOp {
        op: BinOp,
        result_ty: ExprT,
        lhs: Operand,
        rhs: Operand,
    },
    /// A unary cast.
    Cast {
        op: CastOp,
        result_ty: ExprT,
        operand: Operand,
    },
    /// Build an aggregate (struct) value out of field operands.
    Struct {
        result_ty: ExprT,
        fields: Vec<Operand>,
    },
    /// Extract one field out of an aggregate value.
    ExtractValue { index: u32, aggregate: Operand },
    /// Replace one field of an aggregate value, producing a new aggregate.
    InsertValue {
        result_ty: ExprT,
        aggregate: Operand,
        value: Operand,
        index: u32,
    },
    /// An integer comparison.
    ICmp {
        predicate: ICmpPredicate,
        lhs: Operand,
        rhs: Operand,
    },
    /// An opaque pointer computation; evaluated as a `GEP` constant.
    GetElementPtr,
    /// A memory load, paired at runtime with an `Addr(Load, _)` trace event.
    Load { result_ty: ExprT, address: Operand },
    /// A memory store, paired (unless `volatile`) with an `Addr(Store, _)`
    /// trace event.
    Store {
        address: Operand,
        value: Operand,
        volatile: bool,
    },
    /// Select the incoming value from `previous_block`.
    Phi { incoming: Vec<(Tid, Operand)> },
    /// A call. `callee` names the target function; if it resolves to an
    /// external function flagged as an intrinsic, the evaluator builds an
    /// `Intrinsic` expression instead of recursing into it.
    Call {
        callee: String,
        args: Vec<Operand>,
        intrinsic_name: Option<String>,
    },
    /// Stack allocation; has no symbolic effect.
    Alloca,
    /// Return from the current function.
    Ret { value: Option<Operand> },
    /// Unconditional intraprocedural jump.
    Br { target: Tid },
    /// Conditional intraprocedural jump, paired with a `Branch(i)` event.
    CondBr {
        condition: Operand,
        true_target: Tid,
        false_target: Tid,
    },
    /// A value selected between two alternatives, paired with a `Select(i)`
    /// trace event.
    Select {
        condition: Operand,
        true_value: Operand,
        false_value: Operand,
    },
    /// Multi-way branch; currently a no-op for the evaluator (see DESIGN.md).
    Switch { condition: Operand },
    /// Marks unreachable code.
    Unreachable,
}

/// One instruction: its (possibly absent) SSA result name, its containing
/// block, and its kind-specific payload.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Instruction {
    /// The SSA identifier this instruction's result is bound to, if it
    /// produces one.
    pub name: Option<String>,
    /// The basic block this instruction belongs to.
    pub block: Tid,
    /// The instruction's kind and operands.
    pub kind: InstructionKind,
}

/// A maximal straight-line sequence of instructions ending in exactly one
/// terminator (`Ret`, `Br`, `CondBr`, `Unreachable`).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct BasicBlock {
    /// The block's term identifier.
    pub tid: Tid,
    /// The instructions of the block in program order, terminator last.
    pub instructions: Vec<Instruction>,
}

/// Attributes of an externally defined function relevant to the evaluator:
/// whether it is known not to return, and whether it should be modeled as
/// an intrinsic (`memset`/`memcpy`/the sentinel `log_dynval` no-op, etc.)
/// rather than inlined.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct ExternalFunctionDecl {
    /// `true` if calls to this function never return to the caller.
    pub no_return: bool,
}

/// A function: either IR-defined (has basic blocks, may be inlined as a
/// helper) or external (has no blocks, calls to it are modeled via
/// [`ExternalFunctionDecl`]).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Function {
    /// The function's term identifier.
    pub tid: Tid,
    /// The function's name, used to look it up from a `Call` instruction
    /// and from the `interesting_functions` analysis option.
    pub name: String,
    /// SSA identifiers of the formal parameters, in call order.
    pub parameters: Vec<String>,
    /// The function's basic blocks in declaration order. The entry block
    /// is always `blocks[0]`.
    pub blocks: Vec<BasicBlock>,
    /// Present for external (non-IR-defined) functions.
    pub external: Option<ExternalFunctionDecl>,
}

impl Function {
    /// `true` if this function has no IR body, i.e. it is resolved by the
    /// runtime/libc rather than translated guest code.
    pub fn is_external(&self) -> bool {
        self.external.is_some()
    }

    /// Look up a basic block by `Tid`.
    pub fn block(&self, tid: &Tid) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| &b.tid == tid)
    }
}

/// A parsed IR module: all functions, keyed by name.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct IrModule {
    functions: HashMap<String, Function>,
}

impl IrModule {
    /// An empty module, useful as a test fixture builder seed.
    pub fn new() -> IrModule {
        IrModule::default()
    }

    /// Insert or replace a function by name.
    pub fn insert_function(&mut self, function: Function) {
        self.functions.insert(function.name.clone(), function);
    }

    /// Look up a function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Parse an `IrModule` from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<IrModule> {
        let module: IrModule =
            serde_json::from_reader(reader).context("failed to parse IR module JSON")?;
        Ok(module)
    }

    /// Parse an `IrModule` from a JSON file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<IrModule> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("failed to open IR module file {:?}", path.as_ref()))?;
        IrModule::from_reader(file)
    }
}
