//! The symbolic evaluator (component D): interprets an associated
//! `MemlogList` over a [`SymbolicState`], producing an environment of
//! expressions, interesting-event messages, and warnings.
//!
//! Grounded on the pack's own symbolic-memory stepper
//! (`laurmaedje-symslice`'s `SymState::step`): one function per
//! instruction kind, threading a mutable state, with lookups falling back
//! to a freshly synthesized symbolic value when a location has never been
//! written.

pub mod build;
pub mod state;

use crate::associator::{AssociatedEvent, AssociatedInstruction, MemlogList};
use crate::intermediate_representation::expression::simplify;
use crate::intermediate_representation::{
    ConstValue, Expr, ExprT, Function, Instruction, InstructionKind, IrModule, Operand,
};
use crate::prelude::*;
use crate::trace::memlog::AddrOp;
use crate::trace::{AddrEntry, Loc, MemlogOp, Message};

pub use build::Build;
pub use state::SymbolicState;

/// Run every block of `list` against `state`, in order. Returns the last
/// block's return expression.
pub fn run_blocks(state: &mut SymbolicState, module: &IrModule, list: &MemlogList) -> Result<Option<Expr>> {
    state.progress_tick();
    let mut ret = None;
    for block in &list.blocks {
        state.function = block.function.clone();
        state.skip_rest = false;
        state.ret_val = None;
        for associated in &block.instructions {
            if state.skip_rest {
                continue;
            }
            step(state, module, associated)?;
        }
        state.previous_block = Some(block.block_tid.clone());
        ret = state.ret_val.clone();
    }
    Ok(ret)
}

fn step(state: &mut SymbolicState, module: &IrModule, associated: &AssociatedInstruction) -> Result<()> {
    let instruction = &associated.instruction;
    state.debug_trace(format!(
        "processing {:?} (event: {:?})",
        instruction.name, associated.event
    ));
    match &instruction.kind {
        InstructionKind::BinaryOp { op, result_ty, lhs, rhs } => {
            let build = resolve_operand(state, lhs).and_then(|l| {
                resolve_operand(state, rhs).map(|r| {
                    Expr::Binary {
                        op: *op,
                        ty: *result_ty,
                        lhs: Box::new(l.clone()),
                        rhs: Box::new(r),
                    }
                })
            });
            bind_result(state, instruction, build);
        }
        InstructionKind::Cast { op, result_ty, operand } => {
            let build = resolve_operand(state, operand)
                .map(|arg| Expr::Cast { op: *op, ty: *result_ty, arg: Box::new(arg) });
            bind_result(state, instruction, build);
        }
        InstructionKind::Struct { result_ty, fields } => {
            let mut built = Vec::with_capacity(fields.len());
            let mut irrelevant = false;
            let mut failed = None;
            for field in fields {
                match resolve_operand(state, field) {
                    Build::Just(e) => built.push(e),
                    Build::Irrelevant => {
                        irrelevant = true;
                        break;
                    }
                    Build::Err(e) => {
                        failed = Some(e);
                        break;
                    }
                }
            }
            let build = if irrelevant {
                Build::Irrelevant
            } else if let Some(err) = failed {
                Build::Err(err)
            } else {
                Build::Just(Expr::Struct { ty: *result_ty, fields: built })
            };
            bind_result(state, instruction, build);
        }
        InstructionKind::ExtractValue { index, aggregate } => {
            let build = resolve_operand(state, aggregate)
                .map(|agg| Expr::Extract { ty: ExprT::Void, index: *index, aggregate: Box::new(agg) });
            bind_result(state, instruction, build);
        }
        InstructionKind::InsertValue { result_ty, aggregate, value, index } => {
            let build = resolve_operand(state, aggregate).and_then(|agg| {
                resolve_operand(state, value).and_then(|val| build_insert_value(*result_ty, agg.clone(), val, *index))
            });
            bind_result(state, instruction, build);
        }
        InstructionKind::ICmp { predicate, lhs, rhs } => {
            let build = resolve_operand(state, lhs).and_then(|l| {
                resolve_operand(state, rhs).map(|r| Expr::ICmp {
                    predicate: *predicate,
                    lhs: Box::new(l.clone()),
                    rhs: Box::new(r),
                })
            });
            bind_result(state, instruction, build);
        }
        InstructionKind::GetElementPtr => {
            bind_result(state, instruction, Build::Just(Expr::Gep));
        }
        InstructionKind::Load { result_ty, address } => {
            step_load(state, instruction, *result_ty, address, associated.event.as_ref());
        }
        InstructionKind::Store { address, value, volatile } => {
            step_store(state, instruction, address, value, *volatile, associated.event.as_ref());
        }
        InstructionKind::Phi { incoming } => {
            step_phi(state, instruction, incoming)?;
        }
        InstructionKind::Call { callee, args, intrinsic_name } => {
            step_call(state, module, instruction, callee, args, intrinsic_name.as_deref(), associated.event.as_ref())?;
        }
        InstructionKind::Alloca => {}
        InstructionKind::Ret { value } => {
            state.ret_val = match value {
                Some(operand) => resolve_operand(state, operand).into_option(),
                None => None,
            };
        }
        InstructionKind::Br { .. } => {
            state.push_message(Message::UnconditionalBranch);
        }
        InstructionKind::CondBr { condition, .. } => {
            if let Some(AssociatedEvent::Op(MemlogOp::Branch(i))) = &associated.event {
                let cond = resolve_operand(state, condition).into_option().unwrap_or(Expr::Irrelevant);
                state.push_message(Message::Branch {
                    condition: simplify(cond),
                    taken: *i == 0,
                });
            } else {
                state.warn("conditional branch with no recorded outcome");
            }
        }
        InstructionKind::Select { condition, true_value, false_value } => {
            let chosen = match &associated.event {
                Some(AssociatedEvent::Op(MemlogOp::Select(i))) => {
                    if *i == 0 { true_value } else { false_value }
                }
                _ => {
                    state.warn("select with no recorded outcome");
                    condition
                }
            };
            let build = resolve_operand(state, chosen);
            bind_result(state, instruction, build);
        }
        InstructionKind::Switch { .. } => {}
        InstructionKind::Unreachable => {
            state.warn("UNREACHABLE INSTRUCTION!");
        }
    }
    Ok(())
}

fn bind_result(state: &mut SymbolicState, instruction: &Instruction, build: Build) {
    match build {
        Build::Just(expr) => {
            if let Some(name) = &instruction.name {
                state.insert(Loc::id(state.function.clone(), name.clone()), simplify(expr));
            }
        }
        Build::Irrelevant => {
            if let Some(name) = &instruction.name {
                state.insert(Loc::id(state.function.clone(), name.clone()), Expr::Irrelevant);
            }
        }
        Build::Err(text) => {
            state.warn(format!(
                "couldn't process inst '{}' with op {:?}: {}",
                instruction.name.as_deref().unwrap_or("<unnamed>"),
                instruction.kind,
                text
            ));
        }
    }
}

fn build_insert_value(ty: ExprT, aggregate: Expr, value: Expr, index: u32) -> Build {
    let mut fields = match aggregate {
        Expr::Struct { fields, .. } => fields,
        Expr::Undefined => Vec::new(),
        other => {
            return Build::Err(format!("insertvalue on non-aggregate expression {:?}", other));
        }
    };
    while fields.len() <= index as usize {
        fields.push(Expr::Undefined);
    }
    fields[index as usize] = value;
    Build::Just(Expr::Struct { ty, fields })
}

fn resolve_operand(state: &SymbolicState, operand: &Operand) -> Build {
    match operand {
        Operand::Value(name) => {
            match state.get(&Loc::id(state.function.clone(), name.clone())) {
                Some(info) if info.expr.is_irrelevant() => Build::Irrelevant,
                Some(info) => Build::Just(info.expr.clone()),
                None => Build::Err(format!("unbound SSA value '{}'", name)),
            }
        }
        Operand::Const(c) => build_const(c),
    }
}

fn build_const(c: &ConstValue) -> Build {
    match c {
        ConstValue::Int(n) => Build::Just(Expr::ILit(*n)),
        ConstValue::Float(f) => Build::Just(Expr::FLit(*f)),
        ConstValue::Undef => Build::Just(Expr::Undefined),
        ConstValue::Instruction(kind) => match kind.as_ref() {
            InstructionKind::GetElementPtr => Build::Just(Expr::Gep),
            other => Build::Err(format!("unsupported constant expression {:?}", other)),
        },
    }
}

fn step_load(
    state: &mut SymbolicState,
    instruction: &Instruction,
    ty: ExprT,
    address_operand: &Operand,
    event: Option<&AssociatedEvent>,
) {
    let addr = match event {
        Some(AssociatedEvent::Op(MemlogOp::Addr(AddrOp::Load, addr))) => *addr,
        _ => {
            state.warn("load with no recorded address");
            return;
        }
    };
    let loc = Loc::mem(addr);
    let expr = match state.get(&loc) {
        Some(info) => info.expr.clone(),
        None => {
            let name = state.fresh_load_name(ty, addr);
            Expr::Load { ty, address: addr, name }
        }
    };
    let expr = simplify(expr);
    if !addr.is_uninteresting() {
        let origin = resolve_operand(state, address_operand)
            .into_option()
            .map(Expr::strip_outer_int_to_ptr);
        state.push_message(Message::Memory {
            op: AddrOp::Load,
            address: addr.pretty(),
            value: expr.clone(),
            origin,
        });
    }
    if let Some(name) = &instruction.name {
        state.insert(Loc::id(state.function.clone(), name.clone()), expr);
    }
}

fn step_store(
    state: &mut SymbolicState,
    instruction: &Instruction,
    address_operand: &Operand,
    value_operand: &Operand,
    volatile: bool,
    event: Option<&AssociatedEvent>,
) {
    let _ = instruction;
    if volatile {
        match resolve_operand(state, value_operand) {
            Build::Just(Expr::ILit(n)) => state.current_ip = Some(n as u64),
            _ => state.warn("volatile store to the IP slot was not a constant integer"),
        }
        return;
    }
    let addr = match event {
        Some(AssociatedEvent::Op(MemlogOp::Addr(AddrOp::Store, addr))) => *addr,
        _ => {
            state.warn("store with no recorded address");
            return;
        }
    };
    let value = resolve_operand(state, value_operand);
    let value_expr = match &value {
        Build::Just(e) => simplify(e.clone()),
        Build::Irrelevant => Expr::Irrelevant,
        Build::Err(text) => {
            state.warn(format!("couldn't build store value: {}", text));
            return;
        }
    };
    if !addr.is_uninteresting() {
        let origin = resolve_operand(state, address_operand)
            .into_option()
            .map(Expr::strip_outer_int_to_ptr);
        state.push_message(Message::Memory {
            op: AddrOp::Store,
            address: addr.pretty(),
            value: value_expr.clone(),
            origin,
        });
    }
    state.insert(Loc::mem(addr), value_expr);
}

fn step_phi(state: &mut SymbolicState, instruction: &Instruction, incoming: &[(crate::intermediate_representation::Tid, Operand)]) -> Result<()> {
    let previous = state
        .previous_block
        .clone()
        .ok_or_else(|| anyhow!("phi in function {:?} with no previous block", state.function))?;
    let operand = incoming
        .iter()
        .find(|(tid, _)| *tid == previous)
        .map(|(_, operand)| operand)
        .ok_or_else(|| {
            anyhow!(
                "phi in function {:?} has no incoming value for block {}",
                state.function,
                previous
            )
        })?;
    let build = resolve_operand(state, operand);
    bind_result(state, instruction, build);
    Ok(())
}

fn step_call(
    state: &mut SymbolicState,
    module: &IrModule,
    instruction: &Instruction,
    callee: &str,
    args: &[Operand],
    intrinsic_name: Option<&str>,
    event: Option<&AssociatedEvent>,
) -> Result<()> {
    if callee == "log_dynval" {
        return Ok(());
    }
    match intrinsic_name {
        Some("memset") => {
            step_memset(state, instruction, args, event);
            return Ok(());
        }
        Some("memcpy") => {
            step_memcpy(state, args, event);
            return Ok(());
        }
        Some(name) => {
            let mut built = Vec::with_capacity(args.len());
            let mut irrelevant = false;
            for arg in args {
                match resolve_operand(state, arg) {
                    Build::Just(e) => built.push(e),
                    Build::Irrelevant => {
                        irrelevant = true;
                        break;
                    }
                    Build::Err(_) => {
                        irrelevant = false;
                        break;
                    }
                }
            }
            let build = if irrelevant {
                Build::Irrelevant
            } else if built.len() == args.len() {
                Build::Just(Expr::Intrinsic { name: name.to_string(), ty: ExprT::Int64, args: built })
            } else {
                Build::Err(format!("couldn't build arguments for intrinsic '{}'", name))
            };
            bind_result(state, instruction, build);
            return Ok(());
        }
        None => {}
    }
    if let Some(AssociatedEvent::Helper(sub_memlog)) = event {
        step_helper(state, module, instruction, callee, args, sub_memlog)?;
        return Ok(());
    }
    let is_no_return = module
        .function(callee)
        .and_then(|f| f.external.as_ref())
        .map_or(false, |e| e.no_return)
        || callee == "cpu_loop_exit";
    if is_no_return {
        state.skip_rest = true;
        return Ok(());
    }
    // An ordinary external call with no modeled effect.
    Ok(())
}

fn step_memset(state: &mut SymbolicState, instruction: &Instruction, args: &[Operand], event: Option<&AssociatedEvent>) {
    let _ = instruction;
    let addr = match event {
        Some(AssociatedEvent::Op(MemlogOp::Memset(addr))) => *addr,
        _ => {
            state.warn("memset with no recorded address");
            return;
        }
    };
    let target_is_struct = matches!(state.get(&Loc::mem(addr)), Some(info) if matches!(info.expr, Expr::Struct { .. }));
    match args.get(2).map(|op| resolve_operand(state, op)) {
        Some(Build::Just(Expr::ILit(n))) => {
            if n > 16 || target_is_struct {
                state.warn("memset length exceeds the tracked byte window");
            }
        }
        _ => state.warn("memset length is not a constant"),
    }
    let value = match args.get(1).map(|op| resolve_operand(state, op)) {
        Some(Build::Just(e)) => simplify(e),
        Some(Build::Irrelevant) => Expr::Irrelevant,
        _ => Expr::Irrelevant,
    };
    if !addr.is_uninteresting() {
        state.push_message(Message::Memory {
            op: AddrOp::Store,
            address: addr.pretty(),
            value: value.clone(),
            origin: None,
        });
    }
    state.insert(Loc::mem(addr), value);
}

fn step_memcpy(state: &mut SymbolicState, args: &[Operand], event: Option<&AssociatedEvent>) {
    let (src, dst) = match event {
        Some(AssociatedEvent::Op(MemlogOp::Memcpy(src, dst))) => (*src, *dst),
        _ => {
            state.warn("memcpy with no recorded addresses");
            return;
        }
    };
    let dst_is_struct = matches!(state.get(&Loc::mem(dst)), Some(info) if matches!(info.expr, Expr::Struct { .. }));
    match args.get(2).map(|op| resolve_operand(state, op)) {
        Some(Build::Just(Expr::ILit(n))) if n > 16 && !dst_is_struct => {
            state.warn("memcpy length exceeds the tracked byte window");
        }
        _ => {}
    }
    if let Some(info) = state.get(&Loc::mem(src)) {
        let value = info.expr.clone();
        state.insert(Loc::mem(dst), value);
    }
}

fn step_helper(
    state: &mut SymbolicState,
    module: &IrModule,
    instruction: &Instruction,
    callee: &str,
    args: &[Operand],
    sub_memlog: &MemlogList,
) -> Result<()> {
    let function: Function = module
        .function(callee)
        .cloned()
        .ok_or_else(|| anyhow!("helper call to unknown function {:?}", callee))?;
    let arg_values: Vec<Expr> = args
        .iter()
        .map(|arg| resolve_operand(state, arg).into_option().unwrap_or(Expr::Irrelevant))
        .collect();
    let saved_function = std::mem::replace(&mut state.function, callee.to_string());
    for (param, value) in function.parameters.iter().zip(arg_values) {
        state.insert(Loc::id(callee.to_string(), param.clone()), value);
    }
    let ret = run_blocks(state, module, sub_memlog)?;
    state.function = saved_function;
    if let (Some(name), Some(expr)) = (&instruction.name, ret) {
        state.insert(Loc::id(state.function.clone(), name.clone()), expr);
    }
    Ok(())
}
