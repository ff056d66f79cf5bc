use diagnostics::SourceLocation;

use crate::types::TypeId;

/// A parameter or variable visible in some open scope.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub ty: TypeId,
    pub slot: usize,
    pub location: SourceLocation,
}

/// Lexical scopes of the function being checked.
///
/// Slots are handed out in declaration order and never reused, so the slot
/// list doubles as the function's local table.
#[derive(Debug)]
pub struct Scopes {
    open: Vec<Vec<usize>>,
    symbols: Vec<Symbol>,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            open: vec![Vec::new()],
            symbols: Vec::new(),
        }
    }

    pub fn begin_scope(&mut self) {
        self.open.push(Vec::new());
    }

    pub fn end_scope(&mut self) {
        self.open.pop();
    }

    /// Innermost visible symbol called `name`.
    pub fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.open
            .iter()
            .rev()
            .flat_map(|scope| scope.iter().rev())
            .map(|&slot| &self.symbols[slot])
            .find(|symbol| symbol.name == name)
    }

    /// Declare `name` in the innermost scope and give it the next slot. A
    /// name already visible in any open scope is returned as the error.
    pub fn declare(
        &mut self,
        name: &str,
        ty: TypeId,
        location: SourceLocation,
    ) -> Result<usize, Symbol> {
        if let Some(existing) = self.resolve(name) {
            return Err(existing.clone());
        }
        let slot = self.symbols.len();
        self.symbols.push(Symbol {
            name: name.to_string(),
            ty,
            slot,
            location,
        });
        if let Some(scope) = self.open.last_mut() {
            scope.push(slot);
        }
        Ok(slot)
    }

    /// Every symbol declared so far, in slot order.
    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}
