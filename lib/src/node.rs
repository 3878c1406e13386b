//! Output node model.
//!
//! The real emitter that serializes the final output tree to text lives outside this crate; what
//! this crate owns is the *shape* of the tree it hands that emitter. The shape is a small closed
//! set of synthesized fragments, generic only in the caller-supplied opaque leaf type `N` used for
//! pass-through source statements/expressions (`OutputStmt::Source` / `OutputExpr::Source`).
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::label::Label;

/// Shared table the assembler fills in as it assigns case indices to labels.
///
/// `LabelRef` holds a handle into this table rather than an eagerly-resolved integer, per the
/// "forward label references" design note: a label can be referenced by an opcode long before the
/// assembler gets around to binding it a case index.
pub type LabelNumbers = Rc<RefCell<HashMap<Label, usize>>>;

/// A forward reference to the case index a label will be assigned.
///
/// Cloning is cheap (it shares the underlying table); resolving before the assembler has bound the
/// label yields `None`.
#[derive(Debug, Clone)]
pub struct LabelRef {
    label: Label,
    numbers: LabelNumbers,
}

impl LabelRef {
    pub fn new(label: Label, numbers: LabelNumbers) -> Self {
        LabelRef { label, numbers }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// The case index this label resolves to, if the assembler has bound one yet.
    pub fn resolve(&self) -> Option<usize> {
        self.numbers.borrow().get(&self.label).copied()
    }
}

/// A templated text fragment with a substitution map.
///
/// The opcode recorder auto-wraps bare string-literal statement text into one of these rather
/// than requiring the caller to build a full expression tree for boilerplate fragments.
#[derive(Debug, Clone)]
pub struct GeneratedNode<N> {
    pub template: &'static str,
    pub substitutions: Vec<(&'static str, OutputExpr<N>)>,
}

/// A synthesized or pass-through output expression.
#[derive(Debug, Clone)]
pub enum OutputExpr<N> {
    /// A caller-supplied expression node, carried through verbatim.
    Source(N),
    Ident(String),
    Member(Box<OutputExpr<N>>, &'static str),
    Array(Vec<OutputExpr<N>>),
    Number(i64),
    Str(String),
    Null,
    /// A label, rendered as its resolved case index.
    LabelNumber(LabelRef),
    Assign(Box<OutputExpr<N>>, Box<OutputExpr<N>>),
    Not(Box<OutputExpr<N>>),
    Call(Box<OutputExpr<N>>, Vec<OutputExpr<N>>),
    New(Box<OutputExpr<N>>, Vec<OutputExpr<N>>),
    /// An anonymous `function (params...) { body }` expression — used only to wrap the assembled
    /// switch body for the `__generator`/`__awaiter` runtime calls; this crate never needs a named
    /// function expression or any other parameter flavor (rest, defaults, ...).
    FunctionExpr {
        params: Vec<&'static str>,
        body: Box<OutputStmt<N>>,
    },
    Generated(GeneratedNode<N>),
}

/// A synthesized or pass-through output statement.
#[derive(Debug, Clone)]
pub enum OutputStmt<N> {
    /// A caller-supplied statement node, carried through verbatim.
    Source(N),
    Expr(OutputExpr<N>),
    If {
        cond: OutputExpr<N>,
        then_branch: Box<OutputStmt<N>>,
    },
    Return(Option<OutputExpr<N>>),
    Throw(OutputExpr<N>),
    Block(Vec<OutputStmt<N>>),
    /// A local variable declaration, e.g. `var a, b;`.
    VarDecl(Vec<String>),
    /// A templated statement fragment, e.g. the sugar `emit_statement_text`/`cache_text` produce.
    Generated(GeneratedNode<N>),
    /// `switch (<discriminant>) { case 0: {...} case 1: {...} ... }`, always on consecutive case
    /// indices starting at 0 — exactly the shape the switch-body assembler produces.
    Switch {
        discriminant: OutputExpr<N>,
        cases: Vec<Vec<OutputStmt<N>>>,
    },
}

/// `__state.<name>`
pub fn state_member<N>(name: &'static str) -> OutputExpr<N> {
    OutputExpr::Member(Box::new(OutputExpr::Ident("__state".to_string())), name)
}

/// `<lhs> = <rhs>;`
pub fn assign_stmt<N>(lhs: OutputExpr<N>, rhs: OutputExpr<N>) -> OutputStmt<N> {
    OutputStmt::Expr(OutputExpr::Assign(Box::new(lhs), Box::new(rhs)))
}

/// `return ["break", <label>];`
pub fn create_inline_break<N>(label: LabelRef) -> OutputStmt<N> {
    OutputStmt::Return(Some(OutputExpr::Array(vec![
        OutputExpr::Str("break".to_string()),
        OutputExpr::LabelNumber(label),
    ])))
}

/// `return ["return", <expr>?];`
pub fn create_inline_return<N>(expr: Option<OutputExpr<N>>) -> OutputStmt<N> {
    OutputStmt::Return(Some(completion_tuple("return", expr)))
}

/// `return ["yield", <expr>?];`
pub fn create_inline_yield<N>(expr: Option<OutputExpr<N>>) -> OutputStmt<N> {
    OutputStmt::Return(Some(completion_tuple("yield", expr)))
}

/// `return ["endfinally"];`
pub fn create_inline_endfinally<N>() -> OutputStmt<N> {
    OutputStmt::Return(Some(OutputExpr::Array(vec![OutputExpr::Str(
        "endfinally".to_string(),
    )])))
}

/// `<receiver>.<method>(<args>)` as a statement, e.g. `__state.trys.push([...]);`
pub fn call_stmt<N>(receiver: OutputExpr<N>, method: &'static str, args: Vec<OutputExpr<N>>) -> OutputStmt<N> {
    OutputStmt::Expr(OutputExpr::Call(
        Box::new(OutputExpr::Member(Box::new(receiver), method)),
        args,
    ))
}

fn completion_tuple<N>(tag: &str, expr: Option<OutputExpr<N>>) -> OutputExpr<N> {
    let mut elements = vec![OutputExpr::Str(tag.to_string())];
    if let Some(expr) = expr {
        elements.push(expr);
    }
    OutputExpr::Array(elements)
}
