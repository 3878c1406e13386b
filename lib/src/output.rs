//! The output builder: wraps an assembled switch body in its surrounding function shape.
//!
//! Wraps an assembled method-shaped body in an outer template, generalized here to the
//! generator/async function templates this crate produces.
use crate::node::{state_member, LabelNumbers, OutputExpr, OutputStmt};
use crate::symbols::SymbolTable;
use crate::text_range::TextRange;

/// The outer shape the assembled body gets wrapped in.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FunctionKind {
    Declaration,
    Method,
    Getter,
    Expression,
    Arrow,
}

/// A parameter in a function's signature, as the output builder hands it to the real emitter.
#[derive(Debug, Clone)]
pub struct GeneratedParameter {
    pub name: String,
    pub rest: bool,
}

/// A fully assembled function, ready to hand to the real emitter.
///
/// `body` is a single `OutputStmt::Block` holding, in order: the optional locals declaration, the
/// hoisted nested functions (as pass-through `Source` statements), and the wrapping `return`
/// statement around the `__generator`/`__awaiter` call.
#[derive(Debug, Clone)]
pub struct GeneratedFunction<N> {
    pub kind: FunctionKind,
    pub name: Option<String>,
    pub location: TextRange,
    pub parameters: Vec<GeneratedParameter>,
    pub body: OutputStmt<N>,
    pub label_numbers: LabelNumbers,
}

fn parameters<N>(symbols: &SymbolTable<N>) -> Vec<GeneratedParameter> {
    symbols
        .parameters()
        .iter()
        .map(|param| GeneratedParameter {
            name: param.name.clone(),
            rest: param.flags.rest,
        })
        .collect()
}

fn prelude<N>(symbols: &SymbolTable<N>) -> Vec<OutputStmt<N>>
where
    N: Clone,
{
    let mut stmts = Vec::new();
    if symbols.has_locals_decl() {
        let names = symbols
            .locals()
            .iter()
            .chain(symbols.named_locals().iter())
            .cloned()
            .collect();
        stmts.push(OutputStmt::VarDecl(names));
    }
    stmts.extend(symbols.functions().iter().cloned().map(OutputStmt::Source));
    stmts
}

fn switch_body<N>(clauses: Vec<Vec<OutputStmt<N>>>) -> OutputStmt<N> {
    OutputStmt::Block(vec![OutputStmt::Switch {
        discriminant: state_member("label"),
        cases: clauses,
    }])
}

fn generator_call<N>(clauses: Vec<Vec<OutputStmt<N>>>) -> OutputExpr<N> {
    OutputExpr::Call(
        Box::new(OutputExpr::Ident("__generator".to_string())),
        vec![OutputExpr::FunctionExpr {
            params: vec!["__state"],
            body: Box::new(switch_body(clauses)),
        }],
    )
}

/// `build_generator_function(kind, name, location)`: wraps the assembled body in
/// `return __generator(function (__state) { switch (__state.label) { ... } });`
pub fn build_generator_function<N>(
    kind: FunctionKind,
    name: Option<String>,
    location: TextRange,
    symbols: &SymbolTable<N>,
    clauses: Vec<Vec<OutputStmt<N>>>,
    label_numbers: LabelNumbers,
) -> GeneratedFunction<N>
where
    N: Clone,
{
    let mut stmts = prelude(symbols);
    stmts.push(OutputStmt::Return(Some(generator_call(clauses))));

    GeneratedFunction {
        kind,
        name,
        location,
        parameters: parameters(symbols),
        body: OutputStmt::Block(stmts),
        label_numbers,
    }
}

/// `build_async_function(kind, name, promise_ctor, location)`: wraps the assembled body in
/// `return new {promise_ctor}(function (__resolve) { __resolve(__awaiter(__generator(function
/// (__state) { switch (__state.label) { ... } }))); });`
pub fn build_async_function<N>(
    kind: FunctionKind,
    name: Option<String>,
    promise_ctor: String,
    location: TextRange,
    symbols: &SymbolTable<N>,
    clauses: Vec<Vec<OutputStmt<N>>>,
    label_numbers: LabelNumbers,
) -> GeneratedFunction<N>
where
    N: Clone,
{
    let awaiter_call = OutputExpr::Call(
        Box::new(OutputExpr::Ident("__awaiter".to_string())),
        vec![generator_call(clauses)],
    );
    let resolve_call = OutputStmt::Expr(OutputExpr::Call(
        Box::new(OutputExpr::Ident("__resolve".to_string())),
        vec![awaiter_call],
    ));
    let executor = OutputExpr::FunctionExpr {
        params: vec!["__resolve"],
        body: Box::new(OutputStmt::Block(vec![resolve_call])),
    };

    let mut stmts = prelude(symbols);
    stmts.push(OutputStmt::Return(Some(OutputExpr::New(
        Box::new(OutputExpr::Ident(promise_ctor)),
        vec![executor],
    ))));

    GeneratedFunction {
        kind,
        name,
        location,
        parameters: parameters(symbols),
        body: OutputStmt::Block(stmts),
        label_numbers,
    }
}
