//! The switch-body assembler: the finalization pass.
//!
//! One forward pass assigning case indices from an ordered label list, accumulating into a current
//! case clause and resolving labels afterward — generalized into the opcode-log/block-event-log
//! lockstep replay this crate's domain needs.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::block_scope::{BlockEventKind, BlockScope, BlockStack};
use crate::label::{Label, LabelAllocator};
use crate::node::{
    assign_stmt, call_stmt, create_inline_break, create_inline_endfinally, create_inline_return,
    create_inline_yield, state_member, LabelNumbers, LabelRef, OutputExpr, OutputStmt,
};
use crate::opcode::{Opcode, OpcodeLog};

/// The assembled function body: an ordered sequence of case clauses plus the shared table their
/// [`LabelRef`] thunks resolve through.
pub struct Assembled<N> {
    pub clauses: Vec<Vec<OutputStmt<N>>>,
    pub label_numbers: LabelNumbers,
}

/// Replay the opcode log and the block-event log in lockstep and produce the switch-cased body.
///
/// Panics if the live block stack (`block_stack`) is not empty — finalization assumes every
/// opened block has already been closed; an unbalanced stack is a caller bug.
pub fn finalize<N: Clone>(
    operations: &OpcodeLog<N>,
    label_allocator: &LabelAllocator,
    block_stack: &BlockStack,
) -> Assembled<N> {
    assert!(
        block_stack.is_empty(),
        "finalize called with an unbalanced block stack"
    );

    log::debug!("finalizing {} recorded operations", operations.len());

    let label_numbers: LabelNumbers = Rc::new(RefCell::new(HashMap::new()));

    let mut labels_by_index: HashMap<usize, Vec<Label>> = HashMap::new();
    for (label, index) in label_allocator.bindings() {
        labels_by_index.entry(index).or_default().push(label);
    }

    let events = block_stack.events();
    let has_protected_regions = events.iter().any(|event| {
        event.kind == BlockEventKind::Open && matches!(event.block, BlockScope::Exception(_))
    });

    let ops: Vec<&Opcode<N>> = operations.iter().map(|(op, _)| op).collect();
    let total_ops = ops.len();

    // Case 0 always exists, whether or not anything ends up being bound to operation index 0:
    // an empty generator body (S1) still needs somewhere to put its synthesized trailing return.
    let mut clauses: Vec<Vec<OutputStmt<N>>> = vec![Vec::new()];
    if has_protected_regions {
        clauses[0].push(assign_stmt(state_member("trys"), OutputExpr::Array(vec![])));
    }

    let mut instruction_was_abrupt = false;
    let mut instruction_was_completion = false;
    let mut event_cursor = 0usize;

    for i in 0..=total_ops {
        // 1. Label sync
        if let Some(bound_labels) = labels_by_index.get(&i) {
            if !bound_labels.is_empty() {
                // Labels bound at operation 0 land in the pre-existing case 0 rather than opening
                // a fresh case — nothing has run yet, so there is nothing to fix up either.
                if i == 0 {
                    for label in bound_labels {
                        label_numbers.borrow_mut().insert(*label, 0);
                    }
                } else {
                    if !(instruction_was_abrupt || instruction_was_completion) {
                        let next_index = clauses.len();
                        clauses.last_mut().unwrap().push(assign_stmt(
                            state_member("label"),
                            OutputExpr::Number(next_index as i64),
                        ));
                    }

                    let case_index = clauses.len();
                    for label in bound_labels {
                        label_numbers.borrow_mut().insert(*label, case_index);
                    }

                    clauses.push(Vec::new());
                    instruction_was_abrupt = false;
                    instruction_was_completion = false;
                }
            }
        }

        // 2. Block sync
        while event_cursor < events.len() && events[event_cursor].operation_offset <= i {
            let event = &events[event_cursor];
            event_cursor += 1;
            if event.kind != BlockEventKind::Open {
                continue;
            }
            if let BlockScope::Exception(cell) = &event.block {
                let region = cell.borrow();
                let label_expr =
                    |label: Label| OutputExpr::LabelNumber(LabelRef::new(label, label_numbers.clone()));
                let optional_label_expr = |label: Option<Label>| match label {
                    Some(label) => label_expr(label),
                    None => OutputExpr::Null,
                };
                let push_args = vec![OutputExpr::Array(vec![
                    label_expr(region.start_label),
                    optional_label_expr(region.catch_label),
                    optional_label_expr(region.finally_label),
                    label_expr(region.end_label),
                ])];
                clauses
                    .last_mut()
                    .expect("case 0 always exists by the time any block can open")
                    .push(call_stmt(state_member("trys"), "push", push_args));
            }
        }

        // 3 & 4. Abrupt/completion gate + opcode dispatch
        if i >= total_ops {
            continue;
        }
        if instruction_was_abrupt || instruction_was_completion {
            continue;
        }

        let statements = clauses.last_mut().unwrap();
        match ops[i] {
            Opcode::Statement(stmt) => {
                if let Some(stmt) = stmt {
                    statements.push(stmt.clone());
                }
            }
            Opcode::Assign(lhs, rhs) => statements.push(assign_stmt(lhs.clone(), rhs.clone())),
            Opcode::Break(label) => {
                statements.push(create_inline_break(LabelRef::new(*label, label_numbers.clone())));
                instruction_was_abrupt = true;
            }
            Opcode::BrTrue(label, cond) => {
                statements.push(OutputStmt::If {
                    cond: cond.clone(),
                    then_branch: Box::new(create_inline_break(LabelRef::new(
                        *label,
                        label_numbers.clone(),
                    ))),
                });
            }
            Opcode::BrFalse(label, cond) => {
                statements.push(OutputStmt::If {
                    cond: OutputExpr::Not(Box::new(cond.clone())),
                    then_branch: Box::new(create_inline_break(LabelRef::new(
                        *label,
                        label_numbers.clone(),
                    ))),
                });
            }
            Opcode::Yield(expr) => {
                statements.push(create_inline_yield(expr.clone()));
                instruction_was_abrupt = true;
            }
            Opcode::Return(expr) => {
                statements.push(create_inline_return(expr.clone()));
                instruction_was_completion = true;
            }
            Opcode::Throw(expr) => {
                statements.push(OutputStmt::Throw(expr.clone()));
                instruction_was_completion = true;
            }
            Opcode::Endfinally => {
                statements.push(create_inline_endfinally());
                instruction_was_abrupt = true;
            }
        }
    }

    // The function fell off the end of the last case without an explicit return. If that case
    // ended abruptly (e.g. on a yield) its last statement already transfers control elsewhere, so
    // the synthesized return needs a case of its own; otherwise it can simply be appended.
    if !instruction_was_completion {
        if instruction_was_abrupt {
            clauses.push(Vec::new());
        }
        clauses.last_mut().unwrap().push(create_inline_return(None));
    }

    log::debug!("assembled {} case clauses", clauses.len());

    Assembled {
        clauses,
        label_numbers,
    }
}
