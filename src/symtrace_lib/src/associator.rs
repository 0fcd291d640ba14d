//! The memlog associator (component C): aligns the flat dynamic trace
//! against the static IR's control flow, producing, for every function on
//! the dynamic call path, an ordered list of `(instruction, optional event)`
//! pairs the evaluator can walk without ever touching the raw trace cursor
//! itself.
//!
//! Grounded on the same cursor-stepping shape the pack's symbolic evaluator
//! uses to walk a block at a time (`SymState`-style single advancing
//! position), generalized here to additionally walk the *static* IR in
//! lock-step rather than just a flat byte buffer.

use crate::config::AnalysisOptions;
use crate::intermediate_representation::{Function, Instruction, InstructionKind, IrModule, Tid};
use crate::prelude::*;
use crate::trace::memlog::AddrOp;
use crate::trace::reader::RawEvent;
use crate::trace::MemlogOp;

/// One instruction of an associated block, paired with the (possibly
/// synthesized) event it consumed, if any.
#[derive(Debug, Clone)]
pub struct AssociatedInstruction {
    pub instruction: Instruction,
    pub event: Option<AssociatedEvent>,
}

/// The event attached to an [`AssociatedInstruction`]. A plain event is a
/// single dynamic record; a helper call carries the callee's own fully
/// associated block list, built by recursing into the same event cursor.
#[derive(Debug, Clone)]
pub enum AssociatedEvent {
    Op(MemlogOp),
    Helper(MemlogList),
}

/// One basic block on the dynamic execution path, with its parent function
/// name attached (the evaluator needs it to set `SymbolicState::function`).
#[derive(Debug, Clone)]
pub struct AssociatedBlock {
    pub function: String,
    pub block_tid: Tid,
    pub instructions: Vec<AssociatedInstruction>,
}

/// The associator's output: the dynamic execution path as a flat sequence
/// of associated blocks (interesting functions only), plus the total
/// instruction count used for progress reporting.
#[derive(Debug, Clone, Default)]
pub struct MemlogList {
    pub blocks: Vec<AssociatedBlock>,
    pub inst_count: usize,
}

/// Associate `events` against `module`, starting at `entry_function`.
pub fn associate(
    module: &IrModule,
    entry_function: &str,
    events: &[RawEvent],
    options: &AnalysisOptions,
) -> Result<MemlogList> {
    let matchers = options.interesting_function_matchers()?;
    let mut associator = MemlogAssociator {
        module,
        events,
        pos: 0,
        options,
        matchers,
        inst_count: 0,
    };
    let blocks = associator.walk_function(entry_function)?;
    Ok(MemlogList {
        blocks,
        inst_count: associator.inst_count,
    })
}

struct MemlogAssociator<'a> {
    module: &'a IrModule,
    events: &'a [RawEvent],
    pos: usize,
    options: &'a AnalysisOptions,
    matchers: Vec<regex::Regex>,
    inst_count: usize,
}

impl<'a> MemlogAssociator<'a> {
    fn pop(&mut self) -> Result<RawEvent> {
        let event = self
            .events
            .get(self.pos)
            .cloned()
            .ok_or_else(|| anyhow!("trace exhausted while aligning instruction"))?;
        self.pos += 1;
        Ok(event)
    }

    fn pop_addr(&mut self, block: &Tid, expected: AddrOp) -> Result<crate::trace::AddrEntry> {
        match self.pop()? {
            RawEvent::Addr(op, addr) if op == expected => Ok(addr),
            other => bail!(
                "alignment fault in block {}: expected an {:?} address record, got {:?}",
                block,
                expected,
                other
            ),
        }
    }

    /// Walk `function_name`'s dynamic execution path to completion
    /// (terminating at a `Ret` or `Unreachable`), consuming events from the
    /// shared cursor regardless of whether the function is "interesting".
    /// Returns the resulting blocks, filtered to empty if the function does
    /// not match the interesting-function patterns.
    fn walk_function(&mut self, function_name: &str) -> Result<Vec<AssociatedBlock>> {
        let function = self
            .module
            .function(function_name)
            .ok_or_else(|| anyhow!("unknown function {:?} on dynamic call path", function_name))?
            .clone();
        let mut blocks = Vec::new();
        let mut current = function
            .blocks
            .get(0)
            .ok_or_else(|| anyhow!("function {:?} has no entry block", function_name))?
            .tid
            .clone();
        loop {
            let block = function
                .block(&current)
                .ok_or_else(|| anyhow!("block {} not found in function {:?}", current, function_name))?
                .clone();
            let (associated, next) = self.walk_block(&function, &block)?;
            blocks.push(associated);
            match next {
                Some(target) => current = target,
                None => break,
            }
        }
        if self.is_interesting(function_name) {
            Ok(blocks)
        } else {
            Ok(Vec::new())
        }
    }

    fn is_interesting(&self, name: &str) -> bool {
        self.options.is_interesting_function(name, &self.matchers)
    }

    /// Walk one block's instructions, returning the associated block and the
    /// `Tid` of the next block to visit, or `None` if the block ends the
    /// function (`Ret`/`Unreachable`).
    fn walk_block(
        &mut self,
        function: &Function,
        block: &crate::intermediate_representation::BasicBlock,
    ) -> Result<(AssociatedBlock, Option<Tid>)> {
        let mut instructions = Vec::new();
        let mut next_block = None;
        for instruction in &block.instructions {
            self.inst_count += 1;
            let event = self.associate_instruction(function, block, instruction)?;
            if let Some(target) = self.branch_target(instruction, &event) {
                next_block = Some(target);
            }
            instructions.push(AssociatedInstruction {
                instruction: instruction.clone(),
                event,
            });
        }
        Ok((
            AssociatedBlock {
                function: function.name.clone(),
                block_tid: block.tid.clone(),
                instructions,
            },
            next_block,
        ))
    }

    fn branch_target(
        &self,
        instruction: &Instruction,
        event: &Option<AssociatedEvent>,
    ) -> Option<Tid> {
        match &instruction.kind {
            InstructionKind::Br { target } => Some(target.clone()),
            InstructionKind::CondBr {
                true_target,
                false_target,
                ..
            } => match event {
                Some(AssociatedEvent::Op(MemlogOp::Branch(i))) => {
                    Some(if *i == 0 {
                        true_target.clone()
                    } else {
                        false_target.clone()
                    })
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn associate_instruction(
        &mut self,
        function: &Function,
        block: &crate::intermediate_representation::BasicBlock,
        instruction: &Instruction,
    ) -> Result<Option<AssociatedEvent>> {
        match &instruction.kind {
            InstructionKind::Load { .. } => {
                let addr = self.pop_addr(&block.tid, AddrOp::Load)?;
                Ok(Some(AssociatedEvent::Op(MemlogOp::Addr(AddrOp::Load, addr))))
            }
            InstructionKind::Store { volatile, .. } => {
                if *volatile {
                    Ok(None)
                } else {
                    let addr = self.pop_addr(&block.tid, AddrOp::Store)?;
                    Ok(Some(AssociatedEvent::Op(MemlogOp::Addr(AddrOp::Store, addr))))
                }
            }
            InstructionKind::Br { .. } => {
                let addr = self.pop_addr(&block.tid, AddrOp::BranchAddr)?;
                Ok(Some(AssociatedEvent::Op(MemlogOp::Addr(
                    AddrOp::BranchAddr,
                    addr,
                ))))
            }
            InstructionKind::CondBr { .. } => match self.pop()? {
                RawEvent::Branch(i) => Ok(Some(AssociatedEvent::Op(MemlogOp::Branch(i)))),
                other => bail!(
                    "alignment fault in block {}: expected a branch outcome, got {:?}",
                    block.tid,
                    other
                ),
            },
            InstructionKind::Select { .. } => match self.pop()? {
                RawEvent::Select(i) => Ok(Some(AssociatedEvent::Op(MemlogOp::Select(i)))),
                other => bail!(
                    "alignment fault in block {}: expected a select outcome, got {:?}",
                    block.tid,
                    other
                ),
            },
            InstructionKind::Call {
                callee,
                intrinsic_name,
                ..
            } => self.associate_call(function, block, callee, intrinsic_name.as_deref()),
            _ => Ok(None),
        }
    }

    fn associate_call(
        &mut self,
        _caller: &Function,
        block: &crate::intermediate_representation::BasicBlock,
        callee: &str,
        intrinsic_name: Option<&str>,
    ) -> Result<Option<AssociatedEvent>> {
        match intrinsic_name {
            Some("memset") => {
                let addr = self.pop_addr(&block.tid, AddrOp::Store)?;
                Ok(Some(AssociatedEvent::Op(MemlogOp::Memset(addr))))
            }
            Some("memcpy") => {
                let src = self.pop_addr(&block.tid, AddrOp::Load)?;
                let dst = self.pop_addr(&block.tid, AddrOp::Store)?;
                Ok(Some(AssociatedEvent::Op(MemlogOp::Memcpy(src, dst))))
            }
            _ => {
                let is_helper = self
                    .module
                    .function(callee)
                    .map_or(false, |f| !f.is_external());
                if is_helper {
                    let nested = self.walk_function(callee)?;
                    let nested_count = nested.iter().map(|b| b.instructions.len()).sum();
                    Ok(Some(AssociatedEvent::Helper(MemlogList {
                        blocks: nested,
                        inst_count: nested_count,
                    })))
                } else {
                    Ok(None)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
