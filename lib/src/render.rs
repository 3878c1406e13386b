//! A pretty-printer for [`crate::node::OutputStmt`]/[`crate::node::OutputExpr`] trees.
//!
//! Test/demo tooling only — the real serialization boundary lives outside this crate; this module
//! exists so the CLI has something to print and so the integration tests in `tests/scenarios.rs`
//! have literal text to assert against. An indentation-tracking wrapper that stamps leading
//! whitespace after every newline rather than building an intermediate string tree.
use std::fmt;

use crate::errors::Error;
use crate::label::Label;
use crate::node::{GeneratedNode, LabelNumbers, OutputExpr, OutputStmt};
use crate::output::{FunctionKind, GeneratedFunction, GeneratedParameter};

struct Renderer {
    buf: String,
    indent: usize,
    at_line_start: bool,
}

impl Renderer {
    fn new() -> Self {
        Renderer {
            buf: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    fn write(&mut self, text: &str) {
        if self.at_line_start && !text.is_empty() {
            self.buf.push_str(&" ".repeat(self.indent * 4));
            self.at_line_start = false;
        }
        self.buf.push_str(text);
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        self.at_line_start = true;
    }

    fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        self.indent += 1;
        f(self);
        self.indent -= 1;
    }
}

/// Render a fully assembled function to pseudo-JS source text.
///
/// `N` must be `Display` purely for this demo renderer's benefit — the library proper never
/// requires it (pass-through source nodes are opaque everywhere else). Fails with
/// [`Error::UnmarkedLabel`] if any `LabelRef` in the tree never got bound a case index, which
/// would mean the generator referenced a label it never called `mark_label` on.
pub fn render_function<N: fmt::Display>(function: &GeneratedFunction<N>) -> Result<String, Error> {
    check_labels_bound(&function.body, &function.label_numbers)?;

    let mut renderer = Renderer::new();
    render_function_header(&mut renderer, function);
    render_stmt(&mut renderer, &function.body, &function.label_numbers);
    Ok(renderer.buf)
}

fn check_labels_bound<N>(stmt: &OutputStmt<N>, label_numbers: &LabelNumbers) -> Result<(), Error> {
    let mut unbound: Option<Label> = None;
    walk_stmt(stmt, &mut |expr| {
        if unbound.is_some() {
            return;
        }
        if let OutputExpr::LabelNumber(label_ref) = expr {
            if label_ref.resolve().is_none() {
                unbound = Some(label_ref.label());
            }
        }
    });
    match unbound {
        Some(label) => Err(Error::UnmarkedLabel { label }),
        None => Ok(()),
    }
}

fn walk_stmt<N>(stmt: &OutputStmt<N>, visit: &mut impl FnMut(&OutputExpr<N>)) {
    match stmt {
        OutputStmt::Source(_) | OutputStmt::VarDecl(_) => {}
        OutputStmt::Expr(expr) => walk_expr(expr, visit),
        OutputStmt::If { cond, then_branch } => {
            walk_expr(cond, visit);
            walk_stmt(then_branch, visit);
        }
        OutputStmt::Return(expr) => {
            if let Some(expr) = expr {
                walk_expr(expr, visit);
            }
        }
        OutputStmt::Throw(expr) => walk_expr(expr, visit),
        OutputStmt::Block(stmts) => {
            for stmt in stmts {
                walk_stmt(stmt, visit);
            }
        }
        OutputStmt::Generated(node) => {
            for (_, expr) in &node.substitutions {
                walk_expr(expr, visit);
            }
        }
        OutputStmt::Switch { discriminant, cases } => {
            walk_expr(discriminant, visit);
            for case in cases {
                for stmt in case {
                    walk_stmt(stmt, visit);
                }
            }
        }
    }
}

fn walk_expr<N>(expr: &OutputExpr<N>, visit: &mut impl FnMut(&OutputExpr<N>)) {
    visit(expr);
    match expr {
        OutputExpr::Source(_)
        | OutputExpr::Ident(_)
        | OutputExpr::Number(_)
        | OutputExpr::Str(_)
        | OutputExpr::Null
        | OutputExpr::LabelNumber(_) => {}
        OutputExpr::Member(receiver, _) => walk_expr(receiver, visit),
        OutputExpr::Array(elements) => {
            for element in elements {
                walk_expr(element, visit);
            }
        }
        OutputExpr::Assign(lhs, rhs) => {
            walk_expr(lhs, visit);
            walk_expr(rhs, visit);
        }
        OutputExpr::Not(inner) => walk_expr(inner, visit),
        OutputExpr::Call(callee, args) => {
            walk_expr(callee, visit);
            for arg in args {
                walk_expr(arg, visit);
            }
        }
        OutputExpr::New(callee, args) => {
            walk_expr(callee, visit);
            for arg in args {
                walk_expr(arg, visit);
            }
        }
        OutputExpr::FunctionExpr { body, .. } => walk_stmt(body, visit),
        OutputExpr::Generated(node) => {
            for (_, expr) in &node.substitutions {
                walk_expr(expr, visit);
            }
        }
    }
}

fn render_function_header<N>(renderer: &mut Renderer, function: &GeneratedFunction<N>) {
    let keyword = match function.kind {
        FunctionKind::Declaration | FunctionKind::Expression => "function",
        FunctionKind::Method | FunctionKind::Getter | FunctionKind::Arrow => "",
    };
    if !keyword.is_empty() {
        renderer.write(keyword);
        renderer.write(" ");
    }
    if let Some(name) = &function.name {
        renderer.write(name);
    }
    render_parameters(renderer, &function.parameters);
    renderer.write(" ");
}

fn render_parameters(renderer: &mut Renderer, parameters: &[GeneratedParameter]) {
    renderer.write("(");
    for (i, param) in parameters.iter().enumerate() {
        if i > 0 {
            renderer.write(", ");
        }
        if param.rest {
            renderer.write("...");
        }
        renderer.write(&param.name);
    }
    renderer.write(")");
}

fn render_block<N: fmt::Display>(renderer: &mut Renderer, stmts: &[OutputStmt<N>], label_numbers: &LabelNumbers) {
    renderer.write("{");
    renderer.newline();
    renderer.indented(|r| {
        for stmt in stmts {
            render_stmt(r, stmt, label_numbers);
        }
    });
    renderer.write("}");
    renderer.newline();
}

fn render_stmt<N: fmt::Display>(renderer: &mut Renderer, stmt: &OutputStmt<N>, label_numbers: &LabelNumbers) {
    match stmt {
        OutputStmt::Source(node) => {
            renderer.write(&node.to_string());
            renderer.write(";");
            renderer.newline();
        }
        OutputStmt::Expr(expr) => {
            render_expr(renderer, expr, label_numbers);
            renderer.write(";");
            renderer.newline();
        }
        OutputStmt::If { cond, then_branch } => {
            renderer.write("if (");
            render_expr(renderer, cond, label_numbers);
            renderer.write(") ");
            render_stmt(renderer, then_branch, label_numbers);
        }
        OutputStmt::Return(expr) => {
            renderer.write("return");
            if let Some(expr) = expr {
                renderer.write(" ");
                render_expr(renderer, expr, label_numbers);
            }
            renderer.write(";");
            renderer.newline();
        }
        OutputStmt::Throw(expr) => {
            renderer.write("throw ");
            render_expr(renderer, expr, label_numbers);
            renderer.write(";");
            renderer.newline();
        }
        OutputStmt::Block(stmts) => render_block(renderer, stmts, label_numbers),
        OutputStmt::VarDecl(names) => {
            renderer.write("var ");
            renderer.write(&names.join(", "));
            renderer.write(";");
            renderer.newline();
        }
        OutputStmt::Generated(node) => {
            render_generated(renderer, node, label_numbers);
            renderer.newline();
        }
        OutputStmt::Switch { discriminant, cases } => {
            renderer.write("switch (");
            render_expr(renderer, discriminant, label_numbers);
            renderer.write(") {");
            renderer.newline();
            renderer.indented(|r| {
                for (index, statements) in cases.iter().enumerate() {
                    r.write(&format!("case {}: ", index));
                    render_block(r, statements, label_numbers);
                }
            });
            renderer.write("}");
            renderer.newline();
        }
    }
}

fn render_expr<N: fmt::Display>(renderer: &mut Renderer, expr: &OutputExpr<N>, label_numbers: &LabelNumbers) {
    match expr {
        OutputExpr::Source(node) => renderer.write(&node.to_string()),
        OutputExpr::Ident(name) => renderer.write(name),
        OutputExpr::Member(receiver, field) => {
            render_expr(renderer, receiver, label_numbers);
            renderer.write(".");
            renderer.write(field);
        }
        OutputExpr::Array(elements) => {
            renderer.write("[");
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    renderer.write(", ");
                }
                render_expr(renderer, element, label_numbers);
            }
            renderer.write("]");
        }
        OutputExpr::Number(n) => renderer.write(&n.to_string()),
        OutputExpr::Str(s) => renderer.write(&format!("{:?}", s)),
        OutputExpr::Null => renderer.write("null"),
        OutputExpr::LabelNumber(label_ref) => {
            let text = label_ref
                .resolve()
                .map(|n| n.to_string())
                .unwrap_or_else(|| "null".to_string());
            renderer.write(&text);
        }
        OutputExpr::Assign(lhs, rhs) => {
            render_expr(renderer, lhs, label_numbers);
            renderer.write(" = ");
            render_expr(renderer, rhs, label_numbers);
        }
        OutputExpr::Not(inner) => {
            renderer.write("!");
            render_expr(renderer, inner, label_numbers);
        }
        OutputExpr::Call(callee, args) => {
            render_expr(renderer, callee, label_numbers);
            render_args(renderer, args, label_numbers);
        }
        OutputExpr::New(callee, args) => {
            renderer.write("new ");
            render_expr(renderer, callee, label_numbers);
            render_args(renderer, args, label_numbers);
        }
        OutputExpr::FunctionExpr { params, body } => {
            renderer.write("function (");
            renderer.write(&params.join(", "));
            renderer.write(") ");
            render_stmt(renderer, body, label_numbers);
        }
        OutputExpr::Generated(node) => render_generated(renderer, node, label_numbers),
    }
}

fn render_args<N: fmt::Display>(renderer: &mut Renderer, args: &[OutputExpr<N>], label_numbers: &LabelNumbers) {
    renderer.write("(");
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            renderer.write(", ");
        }
        render_expr(renderer, arg, label_numbers);
    }
    renderer.write(")");
}

/// Substitute `{name}` placeholders in `node.template` with their rendered expressions, in order.
fn render_generated<N: fmt::Display>(renderer: &mut Renderer, node: &GeneratedNode<N>, label_numbers: &LabelNumbers) {
    let mut rest = node.template;
    let mut substitutions = node.substitutions.iter();
    while let Some(brace) = rest.find('{') {
        renderer.write(&rest[..brace]);
        let close = rest[brace..]
            .find('}')
            .map(|offset| brace + offset)
            .unwrap_or(rest.len());
        if let Some((_, expr)) = substitutions.next() {
            render_expr(renderer, expr, label_numbers);
        }
        rest = &rest[(close + 1).min(rest.len())..];
    }
    renderer.write(rest);
}
