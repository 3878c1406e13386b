use crate::label::Label;

/// Errors this crate can report back to its caller.
///
/// A flat `Debug`-only enum — there is no `Display`/`std::error::Error` impl, and callers are
/// expected to match on variants or print them with `{:?}`. Programmer misuse of the imperative
/// recording API (wrong block kind popped, illegal exception-state transition,
/// `end_exception_block` with no catch or finally) is *not* represented here: those are invariant
/// violations and `panic!` instead (see the module docs on `block_scope` and `generator`).
#[derive(Debug)]
pub enum Error {
    /// `find_break_target` could not resolve a `break` (optionally labelled) to any enclosing
    /// block. This is a user input error (an unbound label in the source being compiled), not a
    /// bug in this crate or its caller.
    UnboundBreakTarget { label_text: Option<String> },

    /// `find_continue_target` could not resolve a `continue` (optionally labelled) to any
    /// enclosing block.
    UnboundContinueTarget { label_text: Option<String> },

    /// A label was referenced by an emitted opcode but was never bound with `mark_label` before
    /// finalization.
    UnmarkedLabel { label: Label },

    /// `build_generator_function`/`build_async_function` was called more than once on the same
    /// generator. A `CodeGenerator` is single-use.
    GeneratorAlreadyFinalized,
}
