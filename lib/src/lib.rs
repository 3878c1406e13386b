//! Lowers generator/async functions with structured control flow (`break`, `continue`,
//! `try`/`catch`/`finally`, `yield`, `return`) into a flat, label-addressed switch state machine
//! that a `__generator`/`__awaiter` runtime pair can drive step by step.
//!
//! The entry point is [`generator::create_code_generator`], which returns a
//! [`generator::CodeGenerator`] a caller drives imperatively while walking the source AST of one
//! function at a time:
//!
//! ```
//! use genlower::generator::create_code_generator;
//! use genlower::output::FunctionKind;
//! use genlower::text_range::TextRange;
//!
//! let mut gen = create_code_generator::<()>();
//! gen.emit_yield(None);
//! let function = gen
//!     .build_generator_function(FunctionKind::Expression, None, TextRange::default())
//!     .expect("a freshly created generator always finalizes successfully");
//! ```
//!
//! This crate only ever produces the closed [`node::OutputStmt`]/[`node::OutputExpr`] tree shapes
//! named in its design — it never emits text itself. [`render`] is demo/test tooling that turns
//! that tree into pseudo-JS source for the `genlower` CLI and the integration tests; a real
//! embedding is expected to walk the tree with its own emitter instead.
pub mod assembler;
pub mod block_scope;
pub mod errors;
pub mod generator;
pub mod label;
pub mod node;
pub mod opcode;
pub mod output;
pub mod render;
pub mod symbols;
pub mod text_range;

pub use errors::Error;
pub use generator::{create_code_generator, CodeGenerator};
pub use label::Label;
