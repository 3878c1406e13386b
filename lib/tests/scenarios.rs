//! End-to-end scenarios S1–S6, exercised through the public `CodeGenerator` facade and asserted
//! against the `render`ed text (so these act as both API-usage examples and regression tests for
//! the switch-body assembler).
use std::fmt;

use genlower::create_code_generator;
use genlower::node::OutputExpr;
use genlower::output::FunctionKind;
use genlower::render::render_function;
use genlower::text_range::TextRange;

/// A trivial opaque pass-through node for tests: just literal text.
#[derive(Debug, Clone)]
struct Frag(&'static str);

impl fmt::Display for Frag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

fn frag(text: &'static str) -> OutputExpr<Frag> {
    OutputExpr::Source(Frag(text))
}

fn case_count(rendered: &str) -> usize {
    (0..)
        .take_while(|i| rendered.contains(&format!("case {}:", i)))
        .count()
}

// S1 — empty generator: a single case whose body is the synthesized `return ["return"];`.
#[test]
fn s1_empty_generator() {
    let mut gen = create_code_generator::<Frag>();
    let function = gen
        .build_generator_function(FunctionKind::Expression, None, TextRange::default())
        .unwrap();
    let rendered = render_function(&function).unwrap();

    assert_eq!(case_count(&rendered), 1);
    assert!(rendered.contains("case 0:"));
    assert!(rendered.contains("return [\"return\"];"));
}

// S2 — a single yield: two cases, no fall-through fix-up (yield is abrupt).
#[test]
fn s2_single_yield() {
    let mut gen = create_code_generator::<Frag>();
    gen.emit_yield(Some(OutputExpr::Number(42)));
    let function = gen
        .build_generator_function(FunctionKind::Expression, None, TextRange::default())
        .unwrap();
    let rendered = render_function(&function).unwrap();

    assert_eq!(case_count(&rendered), 2);
    assert!(rendered.contains("return [\"yield\", 42];"));
    assert!(rendered.contains("return [\"return\"];"));
    assert!(!rendered.contains("__state.label = 1;"));
}

// S3 — break-target resolution: a nested break block shadows the outer one unless targeted
// explicitly by label text.
#[test]
fn s3_break_target_resolution() {
    let mut gen = create_code_generator::<Frag>();
    let outer = gen.begin_break_block(Some("outer".to_string()));
    let inner = gen.begin_break_block(None);

    assert_eq!(gen.find_break_target(None).unwrap(), inner);
    assert_eq!(gen.find_break_target(Some("outer")).unwrap(), outer);
    assert!(gen.find_break_target(Some("nonexistent")).is_err());

    gen.end_break_block();
    gen.end_break_block();
}

// S4 — try/finally: the protected-region ABI tuple, the normal-completion break past the
// handler, and the `endfinally` reissue.
#[test]
fn s4_try_finally() {
    let mut gen = create_code_generator::<Frag>();
    let _end = gen.begin_exception_block();
    gen.emit_node(Frag("a"));
    gen.begin_finally_block();
    gen.emit_node(Frag("b"));
    gen.end_exception_block();

    let function = gen
        .build_generator_function(FunctionKind::Expression, None, TextRange::default())
        .unwrap();
    let rendered = render_function(&function).unwrap();

    assert_eq!(case_count(&rendered), 3);
    assert!(rendered.contains("__state.trys = []"));
    assert!(rendered.contains("__state.trys.push([0, null, 1, 2])"));
    assert!(rendered.contains("a;"));
    assert!(rendered.contains("b;"));
    assert!(rendered.contains("return [\"break\", 2];"));
    assert!(rendered.contains("return [\"endfinally\"];"));
}

// S5 — try/catch: the catch slot is populated in the protected-region tuple, and the caught
// value is bound before the handler body runs.
#[test]
fn s5_try_catch() {
    let mut gen = create_code_generator::<Frag>();
    gen.begin_exception_block();
    gen.emit_node(Frag("a"));
    gen.begin_catch_block(Some("e".to_string()));
    gen.emit_node(Frag("b"));
    gen.end_exception_block();

    let function = gen
        .build_generator_function(FunctionKind::Expression, None, TextRange::default())
        .unwrap();
    let rendered = render_function(&function).unwrap();

    assert_eq!(case_count(&rendered), 3);
    assert!(rendered.contains("__state.trys.push([0, 1, null, 2])"));
    assert!(rendered.contains("e = __state.error;"));
    assert!(rendered.contains("a;"));
    assert!(rendered.contains("b;"));
}

// S6 — conditional branch with fall-through: a label marked after a non-abrupt statement forces
// a `__state.label = 1;` fix-up.
#[test]
fn s6_conditional_branch_fallthrough() {
    let mut gen = create_code_generator::<Frag>();
    let target = gen.define_label();
    gen.emit_br_true(target, frag("cond"));
    gen.emit_node(Frag("a"));
    gen.mark_label(target);
    gen.emit_node(Frag("b"));

    let function = gen
        .build_generator_function(FunctionKind::Expression, None, TextRange::default())
        .unwrap();
    let rendered = render_function(&function).unwrap();

    assert_eq!(case_count(&rendered), 2);
    assert!(rendered.contains("if (cond)"));
    assert!(rendered.contains("return [\"break\", 1];"));
    assert!(rendered.contains("__state.label = 1;"));
    assert!(rendered.contains("a;"));
    assert!(rendered.contains("b;"));
}

#[test]
fn unmarked_label_is_reported_as_an_error() {
    let mut gen = create_code_generator::<Frag>();
    let dangling = gen.define_label();
    gen.emit_break(dangling);
    let function = gen
        .build_generator_function(FunctionKind::Expression, None, TextRange::default())
        .unwrap();
    assert!(render_function(&function).is_err());
}
