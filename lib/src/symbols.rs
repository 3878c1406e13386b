//! Declarations hoisted to the top of the assembled function body.
//!
//! Ordered, append-only declaration lists, consumed exactly once when the function is finally
//! assembled.
use crate::node::OutputExpr;
use crate::text_range::TextRange;

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub flags: ParameterFlags,
    pub location: TextRange,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ParameterFlags {
    pub rest: bool,
}

/// Parameters, hoisted locals, and nested function declarations for one function being lowered.
///
/// `locals` holds anonymous slots auto-named `__l{n}`; `named_locals` holds caller-supplied names.
/// The two pools are kept disjoint by construction (`__l{n}` is never a name a caller passes to
/// [`SymbolTable::declare_local`]) so hoisting both at the top of the output body can never
/// collide.
#[derive(Debug, Default)]
pub struct SymbolTable<N> {
    parameters: Vec<Parameter>,
    locals: Vec<String>,
    named_locals: Vec<String>,
    functions: Vec<N>,
    next_anonymous: usize,
}

impl<N> SymbolTable<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_parameter(&mut self, name: impl Into<String>, flags: ParameterFlags, location: TextRange) {
        self.parameters.push(Parameter {
            name: name.into(),
            flags,
            location,
        });
    }

    /// Hoist a nested function declaration verbatim into the output.
    pub fn add_function(&mut self, decl: N) {
        self.functions.push(decl);
    }

    /// Allocate (or register) a local and return a reference expression to it.
    ///
    /// With `name: None` an anonymous `__l{n}` slot is allocated; with `name: Some(_)` the
    /// caller-supplied name is recorded instead. Either way the returned expression is how opcodes
    /// should refer to the slot.
    pub fn declare_local(&mut self, name: Option<String>) -> OutputExpr<N> {
        let resolved = match name {
            Some(name) => {
                self.named_locals.push(name.clone());
                name
            }
            None => {
                let name = format!("__l{}", self.next_anonymous);
                self.next_anonymous += 1;
                self.locals.push(name.clone());
                name
            }
        };
        OutputExpr::Ident(resolved)
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn locals(&self) -> &[String] {
        &self.locals
    }

    pub fn named_locals(&self) -> &[String] {
        &self.named_locals
    }

    pub fn functions(&self) -> &[N] {
        &self.functions
    }

    /// True when the symbol table has any declarations at all worth hoisting.
    pub fn has_locals_decl(&self) -> bool {
        !self.locals.is_empty() || !self.named_locals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_locals_are_disjoint_from_named() {
        let mut symbols: SymbolTable<()> = SymbolTable::new();
        symbols.declare_local(None);
        symbols.declare_local(Some("acc".to_string()));
        symbols.declare_local(None);
        assert_eq!(symbols.locals(), &["__l0".to_string(), "__l1".to_string()]);
        assert_eq!(symbols.named_locals(), &["acc".to_string()]);
    }
}
