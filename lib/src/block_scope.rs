//! The block-scope stack: active nesting of exception / break / continue regions.
//!
//! A tagged union of block kinds, one accessor per field shared across variants, popped with
//! pattern-match-and-`panic!`-on-mismatch. Unlike a stack that is only ever consulted live, this
//! one also appends a parallel Open/Close event log, because the switch-body assembler needs to
//! replay block structure against the opcode log after the fact (see `assembler.rs`).
use std::cell::RefCell;
use std::rc::Rc;

use crate::label::Label;

#[derive(Debug, Copy, Clone, Eq, PartialEq, PartialOrd, Ord)]
pub enum ExceptionState {
    Try,
    Catch,
    Finally,
    Done,
}

#[derive(Debug, Clone)]
pub struct ExceptionBlock {
    pub state: ExceptionState,
    pub start_label: Label,
    pub catch_label: Option<Label>,
    pub catch_variable: Option<String>,
    pub finally_label: Option<Label>,
    pub end_label: Label,
}

#[derive(Debug, Clone)]
pub struct BreakBlock {
    pub break_label: Label,
    pub label_text: Option<String>,
    /// `true` for the script-level variant hosting a top-level labelled statement.
    pub script: bool,
}

#[derive(Debug, Clone)]
pub struct ContinueBlock {
    pub break_label: Label,
    pub continue_label: Label,
    pub label_text: Option<String>,
    pub script: bool,
}

/// One entry in the block nesting: an exception region, or a break/continue target.
///
/// The Exception variant is a shared, mutable cell rather than an owned value: an exception
/// block's `catch_label`/`finally_label`/`state` keep changing after it is pushed (as
/// `begin_catch_block`/`begin_finally_block` are called), but the Open event recorded at push time
/// must still observe the *final* values once the assembler replays the event log after recording
/// has finished. Sharing one cell between the live stack entry and the event keeps both views in
/// lockstep for free.
#[derive(Debug, Clone)]
pub enum BlockScope {
    Exception(Rc<RefCell<ExceptionBlock>>),
    Break(BreakBlock),
    Continue(ContinueBlock),
}

impl BlockScope {
    /// Does this block kind accept an (optionally labelled) `break`?
    fn break_label_for(&self, label_text: Option<&str>) -> Option<Label> {
        let (block_label_text, break_label) = match self {
            BlockScope::Break(b) => (b.label_text.clone(), b.break_label),
            BlockScope::Continue(c) => (c.label_text.clone(), c.break_label),
            BlockScope::Exception(_) => return None,
        };
        let block_label_text = block_label_text.as_deref();
        match label_text {
            None => Some(break_label),
            Some(wanted) if block_label_text == Some(wanted) => Some(break_label),
            Some(_) => None,
        }
    }

    /// Does this block kind accept an (optionally labelled) `continue`?
    fn continue_label_for(&self, label_text: Option<&str>) -> Option<Label> {
        match self {
            BlockScope::Continue(c) => match label_text {
                None => Some(c.continue_label),
                Some(wanted) if c.label_text.as_deref() == Some(wanted) => Some(c.continue_label),
                Some(_) => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BlockEventKind {
    Open,
    Close,
}

/// One entry in the replay log consumed by the switch-body assembler.
#[derive(Debug, Clone)]
pub struct BlockEvent {
    pub kind: BlockEventKind,
    pub operation_offset: usize,
    pub block: BlockScope,
}

/// The live nesting stack plus its Open/Close replay log.
#[derive(Debug, Default)]
pub struct BlockStack {
    live: Vec<BlockScope>,
    events: Vec<BlockEvent>,
}

impl BlockStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn push(&mut self, block: BlockScope, operation_offset: usize) {
        self.events.push(BlockEvent {
            kind: BlockEventKind::Open,
            operation_offset,
            block: block.clone(),
        });
        self.live.push(block);
    }

    /// Pop the top-of-stack Break block. Panics if the top is not a Break block — a caller bug.
    pub fn pop_break(&mut self, operation_offset: usize) -> BreakBlock {
        match self.live.pop() {
            Some(BlockScope::Break(b)) => {
                self.close(BlockScope::Break(b.clone()), operation_offset);
                b
            }
            other => panic!("expected a break block on top of the stack, found {:?}", other),
        }
    }

    /// Pop the top-of-stack Continue block. Panics if the top is not a Continue block.
    pub fn pop_continue(&mut self, operation_offset: usize) -> ContinueBlock {
        match self.live.pop() {
            Some(BlockScope::Continue(c)) => {
                self.close(BlockScope::Continue(c.clone()), operation_offset);
                c
            }
            other => panic!(
                "expected a continue block on top of the stack, found {:?}",
                other
            ),
        }
    }

    /// Pop the top-of-stack Exception block. Panics if the top is not an Exception block, or if
    /// it has not entered at least Catch or Finally.
    pub fn pop_exception(&mut self, operation_offset: usize) -> ExceptionBlock {
        match self.live.pop() {
            Some(BlockScope::Exception(rc)) => {
                {
                    let e = rc.borrow();
                    assert!(
                        e.catch_label.is_some() || e.finally_label.is_some(),
                        "exception block ended with neither a catch nor a finally"
                    );
                }
                self.close(BlockScope::Exception(rc.clone()), operation_offset);
                rc.borrow().clone()
            }
            other => panic!(
                "expected an exception block on top of the stack, found {:?}",
                other
            ),
        }
    }

    /// Borrow the top-of-stack Exception block's shared cell. Panics if the top is not an
    /// Exception block.
    pub fn top_exception(&self) -> Rc<RefCell<ExceptionBlock>> {
        match self.live.last() {
            Some(BlockScope::Exception(rc)) => rc.clone(),
            other => panic!(
                "expected an exception block on top of the stack, found {:?}",
                other
            ),
        }
    }

    fn close(&mut self, block: BlockScope, operation_offset: usize) {
        self.events.push(BlockEvent {
            kind: BlockEventKind::Close,
            operation_offset,
            block,
        });
    }

    /// The label a `break` (optionally targeting `label_text`) should jump to, or `None` if no
    /// enclosing block matches.
    pub fn find_break_target(&self, label_text: Option<&str>) -> Option<Label> {
        self.live
            .iter()
            .rev()
            .find_map(|block| block.break_label_for(label_text))
    }

    /// The label a `continue` (optionally targeting `label_text`) should jump to, or `None` if no
    /// enclosing loop matches. Returns `None` symmetrically with [`BlockStack::find_break_target`]
    /// rather than leaving the no-match case unhandled (see DESIGN.md open question).
    pub fn find_continue_target(&self, label_text: Option<&str>) -> Option<Label> {
        self.live
            .iter()
            .rev()
            .find_map(|block| block.continue_label_for(label_text))
    }

    pub fn events(&self) -> &[BlockEvent] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelAllocator;

    // S3 — break-target resolution
    #[test]
    fn nested_break_blocks_resolve_by_label_text() {
        let mut labels = LabelAllocator::new();
        let mut stack = BlockStack::new();

        let outer_break = labels.define_label();
        stack.push(
            BlockScope::Break(BreakBlock {
                break_label: outer_break,
                label_text: Some("outer".to_string()),
                script: false,
            }),
            0,
        );

        let inner_break = labels.define_label();
        stack.push(
            BlockScope::Break(BreakBlock {
                break_label: inner_break,
                label_text: None,
                script: false,
            }),
            1,
        );

        assert_eq!(stack.find_break_target(None), Some(inner_break));
        assert_eq!(stack.find_break_target(Some("outer")), Some(outer_break));
        assert_eq!(stack.find_break_target(Some("nonexistent")), None);
    }

    #[test]
    fn continue_block_also_answers_break_queries() {
        let mut labels = LabelAllocator::new();
        let mut stack = BlockStack::new();
        let continue_label = labels.define_label();
        let break_label = labels.define_label();
        stack.push(
            BlockScope::Continue(ContinueBlock {
                break_label,
                continue_label,
                label_text: None,
                script: false,
            }),
            0,
        );
        assert_eq!(stack.find_break_target(None), Some(break_label));
        assert_eq!(stack.find_continue_target(None), Some(continue_label));
    }
}
