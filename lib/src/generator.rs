//! The facade: `CodeGenerator<N>` bundles every component behind the imperative API a visitor
//! drives while walking a generator/async function body.
//!
//! A single struct bundling a label generator, symbol/locals tracking, and block-nesting
//! bookkeeping behind one imperative API the caller drives opcode by opcode.
use std::cell::RefCell;
use std::rc::Rc;

use crate::assembler::{self, Assembled};
use crate::block_scope::{
    BlockScope, BlockStack, BreakBlock, ContinueBlock, ExceptionBlock, ExceptionState,
};
use crate::errors::Error;
use crate::label::{Label, LabelAllocator};
use crate::node::OutputExpr;
use crate::opcode::{Opcode, OpcodeLog};
use crate::output::{self, FunctionKind, GeneratedFunction};
use crate::symbols::{ParameterFlags, SymbolTable};
use crate::text_range::{LocationStack, TextRange};

/// The generator/async function lowering pass, one instance per function being lowered.
pub struct CodeGenerator<N> {
    labels: LabelAllocator,
    operations: OpcodeLog<N>,
    symbols: SymbolTable<N>,
    blocks: BlockStack,
    location: LocationStack,
    finalized: bool,
}

/// Start lowering a new function.
pub fn create_code_generator<N>() -> CodeGenerator<N> {
    CodeGenerator {
        labels: LabelAllocator::new(),
        operations: OpcodeLog::new(),
        symbols: SymbolTable::new(),
        blocks: BlockStack::new(),
        location: LocationStack::new(),
        finalized: false,
    }
}

impl<N> CodeGenerator<N> {
    fn push(&mut self, opcode: Opcode<N>) -> usize {
        self.operations.push(opcode, self.location.current())
    }

    // --- Opcode recorder -------------------------------------------------------------

    /// Emit a caller-supplied statement or expression verbatim.
    ///
    /// `N` is opaque to this crate, so this method cannot recurse into a caller's own notion of
    /// "compound block node"; a caller visiting a plain block, function body, try/catch/finally
    /// block, or switch case should call `emit_node` once per statement it contains instead of
    /// once for the whole block. [`CodeGenerator::emit_statement`] does this flattening itself
    /// for an already-built `OutputStmt::Block`.
    pub fn emit_node(&mut self, node: N) {
        self.push(Opcode::Statement(Some(crate::node::OutputStmt::Source(node))));
    }

    /// Recurses into a `Block`, pushing each contained statement as its own `Statement` opcode
    /// (so a label marked between two of its statements binds to the right operation index),
    /// or pushes a single `Statement` opcode otherwise.
    pub fn emit_statement(&mut self, stmt: crate::node::OutputStmt<N>) {
        match stmt {
            crate::node::OutputStmt::Block(stmts) => {
                for inner in stmts {
                    self.emit_statement(inner);
                }
            }
            other => {
                self.push(Opcode::Statement(Some(other)));
            }
        }
    }

    /// `Statement(None)` sugar: lets a caller emit a conditionally-present statement without
    /// branching at every call site.
    pub fn emit_statement_opt(&mut self, stmt: Option<crate::node::OutputStmt<N>>) {
        self.push(Opcode::Statement(stmt));
    }

    /// A string-literal template with named substitutions, auto-wrapped into a `GeneratedNode`.
    pub fn emit_statement_text(
        &mut self,
        template: &'static str,
        substitutions: Vec<(&'static str, OutputExpr<N>)>,
    ) {
        self.emit_statement(crate::node::OutputStmt::Generated(crate::node::GeneratedNode {
            template,
            substitutions,
        }));
    }

    /// Like [`CodeGenerator::cache_expression`], but the cached value comes from a templated text
    /// fragment rather than an already-built expression.
    pub fn cache_text(
        &mut self,
        template: &'static str,
        substitutions: Vec<(&'static str, OutputExpr<N>)>,
    ) -> OutputExpr<N> {
        self.cache_expression(OutputExpr::Generated(crate::node::GeneratedNode {
            template,
            substitutions,
        }))
    }

    pub fn emit_assign(&mut self, lhs: OutputExpr<N>, rhs: OutputExpr<N>) {
        self.push(Opcode::Assign(lhs, rhs));
    }

    pub fn emit_break(&mut self, label: Label) {
        self.push(Opcode::Break(label));
    }

    pub fn emit_br_true(&mut self, label: Label, cond: OutputExpr<N>) {
        self.push(Opcode::BrTrue(label, cond));
    }

    pub fn emit_br_false(&mut self, label: Label, cond: OutputExpr<N>) {
        self.push(Opcode::BrFalse(label, cond));
    }

    pub fn emit_yield(&mut self, expr: Option<OutputExpr<N>>) {
        self.push(Opcode::Yield(expr));
    }

    pub fn emit_return(&mut self, expr: Option<OutputExpr<N>>) {
        self.push(Opcode::Return(expr));
    }

    pub fn emit_throw(&mut self, expr: OutputExpr<N>) {
        self.push(Opcode::Throw(expr));
    }

    pub fn emit_endfinally(&mut self) {
        self.push(Opcode::Endfinally);
    }

    // --- Symbol table ------------------------------------------------------------------

    pub fn add_parameter(&mut self, name: impl Into<String>, flags: ParameterFlags) {
        self.symbols.add_parameter(name, flags, self.location.current());
    }

    pub fn add_function(&mut self, decl: N) {
        self.symbols.add_function(decl);
    }

    pub fn declare_local(&mut self, name: Option<String>) -> OutputExpr<N> {
        self.symbols.declare_local(name)
    }

    /// Allocate an anonymous local, assign `expr` into it, and return a reference to it — used to
    /// avoid re-evaluating an expression that feeds multiple control-flow arms.
    pub fn cache_expression(&mut self, expr: OutputExpr<N>) -> OutputExpr<N> {
        let local = self.symbols.declare_local(None);
        self.emit_assign(local.clone(), expr);
        local
    }

    // --- Label allocator and block scopes ----------------------------------------------

    pub fn define_label(&mut self) -> Label {
        self.labels.define_label()
    }

    pub fn mark_label(&mut self, label: Label) {
        let index = self.operations.len();
        self.labels.mark(label, index);
    }

    fn begin_break_block_impl(&mut self, label_text: Option<String>, script: bool) -> Label {
        let break_label = self.labels.define_label();
        let offset = self.operations.len();
        self.blocks.push(
            BlockScope::Break(BreakBlock {
                break_label,
                label_text,
                script,
            }),
            offset,
        );
        break_label
    }

    pub fn begin_break_block(&mut self, label_text: Option<String>) -> Label {
        self.begin_break_block_impl(label_text, false)
    }

    pub fn begin_script_break_block(&mut self, label_text: Option<String>) -> Label {
        self.begin_break_block_impl(label_text, true)
    }

    pub fn end_break_block(&mut self) {
        let offset = self.operations.len();
        let block = self.blocks.pop_break(offset);
        self.labels.mark(block.break_label, offset);
    }

    fn begin_continue_block_impl(
        &mut self,
        continue_label: Label,
        label_text: Option<String>,
        script: bool,
    ) -> Label {
        let break_label = self.labels.define_label();
        let offset = self.operations.len();
        self.blocks.push(
            BlockScope::Continue(ContinueBlock {
                break_label,
                continue_label,
                label_text,
                script,
            }),
            offset,
        );
        break_label
    }

    pub fn begin_continue_block(&mut self, continue_label: Label, label_text: Option<String>) -> Label {
        self.begin_continue_block_impl(continue_label, label_text, false)
    }

    pub fn begin_script_continue_block(&mut self, continue_label: Label, label_text: Option<String>) -> Label {
        self.begin_continue_block_impl(continue_label, label_text, true)
    }

    pub fn end_continue_block(&mut self) {
        let offset = self.operations.len();
        let block = self.blocks.pop_continue(offset);
        self.labels.mark(block.break_label, offset);
    }

    pub fn find_break_target(&self, label_text: Option<&str>) -> Result<Label, Error> {
        self.blocks
            .find_break_target(label_text)
            .ok_or_else(|| Error::UnboundBreakTarget {
                label_text: label_text.map(str::to_string),
            })
    }

    pub fn find_continue_target(&self, label_text: Option<&str>) -> Result<Label, Error> {
        self.blocks
            .find_continue_target(label_text)
            .ok_or_else(|| Error::UnboundContinueTarget {
                label_text: label_text.map(str::to_string),
            })
    }

    // --- Exception blocks --------------------------------------------------------------------

    pub fn begin_exception_block(&mut self) -> Label {
        let start_label = self.labels.define_label();
        let end_label = self.labels.define_label();
        let offset = self.operations.len();
        self.labels.mark(start_label, offset);

        self.blocks.push(
            BlockScope::Exception(Rc::new(RefCell::new(ExceptionBlock {
                state: ExceptionState::Try,
                start_label,
                catch_label: None,
                catch_variable: None,
                finally_label: None,
                end_label,
            }))),
            offset,
        );
        end_label
    }

    pub fn begin_catch_block(&mut self, variable: Option<String>) -> Label {
        let cell = self.blocks.top_exception();
        let end_label = {
            let region = cell.borrow();
            assert!(
                region.state < ExceptionState::Catch,
                "begin_catch_block called after the block already entered catch or finally"
            );
            region.end_label
        };
        self.emit_break(end_label);

        let catch_label = self.labels.define_label();
        let offset = self.operations.len();
        self.labels.mark(catch_label, offset);

        {
            let mut region = cell.borrow_mut();
            region.state = ExceptionState::Catch;
            region.catch_label = Some(catch_label);
            region.catch_variable = variable.clone();
        }

        if let Some(variable) = variable {
            self.emit_assign(
                OutputExpr::Ident(variable),
                crate::node::state_member("error"),
            );
        }

        catch_label
    }

    pub fn begin_finally_block(&mut self) -> Label {
        let cell = self.blocks.top_exception();
        let end_label = {
            let region = cell.borrow();
            assert!(
                region.state < ExceptionState::Finally,
                "begin_finally_block called after the block already entered finally"
            );
            region.end_label
        };
        self.emit_break(end_label);

        let finally_label = self.labels.define_label();
        let offset = self.operations.len();
        self.labels.mark(finally_label, offset);

        let mut region = cell.borrow_mut();
        region.state = ExceptionState::Finally;
        region.finally_label = Some(finally_label);

        finally_label
    }

    pub fn end_exception_block(&mut self) {
        let cell = self.blocks.top_exception();
        let (end_label, before_finally) = {
            let region = cell.borrow();
            (region.end_label, region.state < ExceptionState::Finally)
        };
        if before_finally {
            self.emit_break(end_label);
        } else {
            self.emit_endfinally();
        }

        let offset = self.operations.len();
        self.labels.mark(end_label, offset);
        cell.borrow_mut().state = ExceptionState::Done;

        self.blocks.pop_exception(offset);
    }

    // --- Location stack ----------------------------------------------------------------------

    pub fn set_location(&mut self, location: TextRange) {
        self.location.set_location(location);
    }

    pub fn push_location(&mut self, location: TextRange) {
        self.location.push_location(location);
    }

    pub fn pop_location(&mut self) {
        self.location.pop_location();
    }

    // --- Output builder ------------------------------------------------------------------

    fn finalize(&mut self) -> Result<Assembled<N>, Error>
    where
        N: Clone,
    {
        if self.finalized {
            return Err(Error::GeneratorAlreadyFinalized);
        }
        self.finalized = true;
        Ok(assembler::finalize(&self.operations, &self.labels, &self.blocks))
    }

    pub fn build_generator_function(
        &mut self,
        kind: FunctionKind,
        name: Option<String>,
        location: TextRange,
    ) -> Result<GeneratedFunction<N>, Error>
    where
        N: Clone,
    {
        let assembled = self.finalize()?;
        Ok(output::build_generator_function(
            kind,
            name,
            location,
            &self.symbols,
            assembled.clauses,
            assembled.label_numbers,
        ))
    }

    pub fn build_async_function(
        &mut self,
        kind: FunctionKind,
        name: Option<String>,
        promise_ctor: String,
        location: TextRange,
    ) -> Result<GeneratedFunction<N>, Error>
    where
        N: Clone,
    {
        let assembled = self.finalize()?;
        Ok(output::build_async_function(
            kind,
            name,
            promise_ctor,
            location,
            &self.symbols,
            assembled.clauses,
            assembled.label_numbers,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // S1 — an empty generator body still assembles to a single synthesized case.
    #[test]
    fn empty_body_assembles_one_case() {
        let mut gen: CodeGenerator<()> = create_code_generator();
        let assembled = gen.finalize().unwrap();
        assert_eq!(assembled.clauses.len(), 1);
    }

    // S2 — a bare yield opens a second case for the synthesized trailing return.
    #[test]
    fn yield_opens_trailing_case() {
        let mut gen: CodeGenerator<()> = create_code_generator();
        gen.emit_yield(Some(OutputExpr::Number(42)));
        let assembled = gen.finalize().unwrap();
        assert_eq!(assembled.clauses.len(), 2);
    }

    #[test]
    fn double_finalize_is_an_error() {
        let mut gen: CodeGenerator<()> = create_code_generator();
        gen.finalize().unwrap();
        let err = gen.finalize().unwrap_err();
        assert!(matches!(err, Error::GeneratorAlreadyFinalized));
    }

    #[test]
    fn break_target_resolves_by_label_text() {
        let mut gen: CodeGenerator<()> = create_code_generator();
        let outer = gen.begin_break_block(Some("outer".to_string()));
        let _inner = gen.begin_break_block(None);
        assert_eq!(gen.find_break_target(None).unwrap(), _inner);
        assert_eq!(gen.find_break_target(Some("outer")).unwrap(), outer);
        assert!(gen.find_break_target(Some("missing")).is_err());
        gen.end_break_block();
        gen.end_break_block();
    }

    // S4 — try/finally marks start/finally/end labels and leaves a balanced stack.
    #[test]
    fn try_finally_leaves_balanced_exception_block() {
        let mut gen: CodeGenerator<()> = create_code_generator();
        let _end = gen.begin_exception_block();
        gen.emit_statement(crate::node::OutputStmt::Expr(OutputExpr::Number(1)));
        gen.begin_finally_block();
        gen.emit_statement(crate::node::OutputStmt::Expr(OutputExpr::Number(2)));
        gen.end_exception_block();
        let assembled = gen.finalize().unwrap();
        assert_eq!(assembled.clauses.len(), 3);
    }
}
