use super::*;
use crate::intermediate_representation::{BasicBlock, Function, Operand};
use crate::trace::{AddrEntry, AddrKind};

fn addr_event(op: AddrOp, value: u64) -> RawEvent {
    RawEvent::Addr(op, AddrEntry::new(AddrKind::MAddr, value))
}

/// `%r = add i32 %a, 0; ret %r` — a single straight-line block, no events.
fn constant_prop_module() -> IrModule {
    let mut module = IrModule::new();
    module.insert_function(Function {
        tid: Tid::new("sub_f"),
        name: "f".to_string(),
        parameters: vec!["a".to_string()],
        blocks: vec![BasicBlock {
            tid: Tid::new("blk0"),
            instructions: vec![
                Instruction {
                    name: Some("r".to_string()),
                    block: Tid::new("blk0"),
                    kind: InstructionKind::BinaryOp {
                        op: crate::intermediate_representation::BinOp::Add,
                        result_ty: crate::intermediate_representation::ExprT::Int32,
                        lhs: Operand::Value("a".to_string()),
                        rhs: Operand::Const(crate::intermediate_representation::ConstValue::Int(0)),
                    },
                },
                Instruction {
                    name: None,
                    block: Tid::new("blk0"),
                    kind: InstructionKind::Ret {
                        value: Some(Operand::Value("r".to_string())),
                    },
                },
            ],
        }],
        external: None,
    });
    module
}

#[test]
fn straight_line_function_consumes_no_events_and_counts_instructions() {
    let module = constant_prop_module();
    let options = AnalysisOptions::default();
    let result = associate(&module, "f", &[], &options).unwrap();
    assert_eq!(result.inst_count, 2);
    assert_eq!(result.blocks.len(), 1);
    assert_eq!(result.blocks[0].instructions.len(), 2);
}

fn branching_module() -> IrModule {
    let mut module = IrModule::new();
    module.insert_function(Function {
        tid: Tid::new("sub_g"),
        name: "g".to_string(),
        parameters: vec![],
        blocks: vec![
            BasicBlock {
                tid: Tid::new("entry"),
                instructions: vec![Instruction {
                    name: None,
                    block: Tid::new("entry"),
                    kind: InstructionKind::CondBr {
                        condition: Operand::Value("c".to_string()),
                        true_target: Tid::new("t"),
                        false_target: Tid::new("f"),
                    },
                }],
            },
            BasicBlock {
                tid: Tid::new("t"),
                instructions: vec![Instruction {
                    name: None,
                    block: Tid::new("t"),
                    kind: InstructionKind::Ret { value: None },
                }],
            },
            BasicBlock {
                tid: Tid::new("f"),
                instructions: vec![Instruction {
                    name: None,
                    block: Tid::new("f"),
                    kind: InstructionKind::Ret { value: None },
                }],
            },
        ],
        external: None,
    });
    module
}

#[test]
fn conditional_branch_follows_recorded_outcome() {
    let module = branching_module();
    let options = AnalysisOptions::default();
    let events = vec![RawEvent::Branch(0)];
    let result = associate(&module, "g", &events, &options).unwrap();
    assert_eq!(result.blocks.len(), 2);
    assert_eq!(result.blocks[1].block_tid, Tid::new("t"));
}

#[test]
fn conditional_branch_takes_false_target_on_nonzero_outcome() {
    let module = branching_module();
    let options = AnalysisOptions::default();
    let events = vec![RawEvent::Branch(1)];
    let result = associate(&module, "g", &events, &options).unwrap();
    assert_eq!(result.blocks[1].block_tid, Tid::new("f"));
}

#[test]
fn missing_event_is_a_fatal_alignment_error() {
    let module = branching_module();
    let options = AnalysisOptions::default();
    let err = associate(&module, "g", &[], &options).unwrap_err();
    assert!(err.to_string().contains("exhausted"));
}

#[test]
fn mismatched_event_kind_is_a_fatal_alignment_error() {
    let module = branching_module();
    let options = AnalysisOptions::default();
    let events = vec![RawEvent::Select(0)];
    let err = associate(&module, "g", &events, &options).unwrap_err();
    assert!(err.to_string().contains("alignment fault"));
}

#[test]
fn uninteresting_function_is_walked_but_discarded() {
    let module = constant_prop_module();
    let options = AnalysisOptions {
        interesting_functions: vec!["^nomatch$".to_string()],
        ..Default::default()
    };
    let result = associate(&module, "f", &[], &options).unwrap();
    assert!(result.blocks.is_empty());
    assert_eq!(result.inst_count, 2);
}

fn module_with_helper() -> IrModule {
    let mut module = constant_prop_module();
    module.insert_function(Function {
        tid: Tid::new("sub_caller"),
        name: "caller".to_string(),
        parameters: vec![],
        blocks: vec![BasicBlock {
            tid: Tid::new("blk0"),
            instructions: vec![
                Instruction {
                    name: Some("h".to_string()),
                    block: Tid::new("blk0"),
                    kind: InstructionKind::Call {
                        callee: "f".to_string(),
                        args: vec![Operand::Const(crate::intermediate_representation::ConstValue::Int(5))],
                        intrinsic_name: None,
                    },
                },
                Instruction {
                    name: None,
                    block: Tid::new("blk0"),
                    kind: InstructionKind::Ret { value: None },
                },
            ],
        }],
        external: None,
    });
    module
}

#[test]
fn helper_call_recurses_and_bundles_nested_blocks() {
    let module = module_with_helper();
    let options = AnalysisOptions::default();
    let result = associate(&module, "caller", &[], &options).unwrap();
    assert_eq!(result.blocks.len(), 1);
    let call = &result.blocks[0].instructions[0];
    match &call.event {
        Some(AssociatedEvent::Helper(nested)) => {
            assert_eq!(nested.blocks.len(), 1);
            assert_eq!(nested.blocks[0].function, "f");
        }
        other => panic!("expected a helper event, got {:?}", other),
    }
    // Ret + BinaryOp from `f`, plus Call + Ret from `caller`.
    assert_eq!(result.inst_count, 4);
}

#[test]
fn memset_consumes_a_single_address() {
    let mut module = IrModule::new();
    module.insert_function(Function {
        tid: Tid::new("sub_h"),
        name: "h".to_string(),
        parameters: vec![],
        blocks: vec![BasicBlock {
            tid: Tid::new("blk0"),
            instructions: vec![
                Instruction {
                    name: None,
                    block: Tid::new("blk0"),
                    kind: InstructionKind::Call {
                        callee: "memset".to_string(),
                        args: vec![],
                        intrinsic_name: Some("memset".to_string()),
                    },
                },
                Instruction {
                    name: None,
                    block: Tid::new("blk0"),
                    kind: InstructionKind::Ret { value: None },
                },
            ],
        }],
        external: None,
    });
    let options = AnalysisOptions::default();
    let events = vec![addr_event(AddrOp::Store, 0x2000)];
    let result = associate(&module, "h", &events, &options).unwrap();
    match &result.blocks[0].instructions[0].event {
        Some(AssociatedEvent::Op(MemlogOp::Memset(addr))) => assert_eq!(addr.value, 0x2000),
        other => panic!("expected a Memset event, got {:?}", other),
    }
}
