//! Static type checking.
//!
//! The checker never touches the AST. Everything it learns is written to an
//! `Analysis` keyed by `NodeId`, which the emitter reads back. It stops at
//! the first error.

use std::collections::HashMap;

use botlang_parser::ast::{FunctionDecl, NodeId, RecordDecl};
use tracing::debug;
use vm::ExternalRegistry;

use crate::error::Result;
use crate::scopes::{Scopes, Symbol};
use crate::types::{TypeId, TypeTable};

pub mod declarations;
pub mod expressions;
pub mod statements;

pub use declarations::DeclarationChecker;
pub use expressions::ExpressionChecker;
pub use statements::StatementChecker;

/// What a call expression (or a rewritten `==`) invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallTarget {
    /// Index into the module's function list.
    Function(usize),
    /// Index into the external registry.
    External(usize),
}

/// A checked function signature and, once its body is checked, its locals.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub name: String,
    /// `name(type,...)`, the key calls are resolved by.
    pub key: String,
    /// `key` plus `:type` when the function returns a value.
    pub signature: String,
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    pub ty: TypeId,
    /// Parameters first, then variables in declaration order.
    pub locals: Vec<Symbol>,
}

impl FunctionInfo {
    pub fn returns_value(&self) -> bool {
        self.return_type != TypeTable::NOTHING
    }
}

/// Side tables filled in by the checker.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub expr_types: HashMap<NodeId, TypeId>,
    pub calls: HashMap<NodeId, CallTarget>,
    /// Slots of parameters, variable declarations, variable reads and
    /// assignment targets.
    pub slots: HashMap<NodeId, usize>,
    /// Field index of every field access.
    pub fields: HashMap<NodeId, usize>,
    /// `==`/`!=` on records that compile to an `equals` call.
    pub equals: HashMap<NodeId, CallTarget>,
    pub functions: Vec<FunctionInfo>,
}

impl Analysis {
    pub fn type_of(&self, id: NodeId) -> TypeId {
        self.expr_types
            .get(&id)
            .copied()
            .unwrap_or(TypeTable::NOTHING)
    }
}

/// The checker's result: the frozen type table, the externals including
/// generated record constructors, and the side tables.
#[derive(Debug, Clone)]
pub struct Checked {
    pub types: TypeTable,
    pub externals: ExternalRegistry,
    pub analysis: Analysis,
}

pub struct Checker<'a> {
    pub(crate) functions: &'a [FunctionDecl],
    pub(crate) records: &'a [RecordDecl],
    pub(crate) types: TypeTable,
    pub(crate) externals: ExternalRegistry,
    pub(crate) analysis: Analysis,
    /// Function key -> index, for user functions.
    pub(crate) function_keys: HashMap<String, usize>,

    // Per-body state
    pub(crate) scopes: Scopes,
    pub(crate) current: usize,
    pub(crate) loop_depth: usize,
}

/// Check `functions` (index 0 is `$main`) and `records` against the host's
/// `externals`.
pub fn check(
    functions: &[FunctionDecl],
    records: &[RecordDecl],
    externals: &ExternalRegistry,
) -> Result<Checked> {
    let mut checker = Checker::new(functions, records, externals.clone());
    checker.register_external_types()?;
    checker.register_external_functions()?;
    checker.register_records()?;
    checker.register_functions()?;
    for index in 0..functions.len() {
        checker.check_function(index)?;
    }
    debug!(
        functions = functions.len(),
        records = records.len(),
        types = checker.types.len(),
        "type check finished"
    );
    Ok(Checked {
        types: checker.types,
        externals: checker.externals,
        analysis: checker.analysis,
    })
}

impl<'a> Checker<'a> {
    pub fn new(
        functions: &'a [FunctionDecl],
        records: &'a [RecordDecl],
        externals: ExternalRegistry,
    ) -> Self {
        Self {
            functions,
            records,
            types: TypeTable::new(),
            externals,
            analysis: Analysis::default(),
            function_keys: HashMap::new(),
            scopes: Scopes::new(),
            current: 0,
            loop_depth: 0,
        }
    }

    pub(crate) fn type_name(&self, id: TypeId) -> String {
        self.types.name(id)
    }

    pub(crate) fn current_function(&self) -> &FunctionInfo {
        &self.analysis.functions[self.current]
    }

    /// Check one body in a fresh scope stack seeded with its parameters.
    fn check_function(&mut self, index: usize) -> Result<()> {
        let functions = self.functions;
        let decl = &functions[index];
        self.current = index;
        self.loop_depth = 0;
        self.scopes = Scopes::new();

        let param_types = self.analysis.functions[index].params.clone();
        for (param, ty) in decl.params.iter().zip(param_types) {
            // Duplicates were rejected while registering the signature.
            if let Ok(slot) = self
                .scopes
                .declare(&param.name.name, ty, param.name.location)
            {
                self.analysis.slots.insert(param.id, slot);
            }
        }

        for stmt in &decl.body {
            self.check_stmt(stmt)?;
        }

        let scopes = std::mem::replace(&mut self.scopes, Scopes::new());
        self.analysis.functions[index].locals = scopes.into_symbols();
        debug!(
            function = %self.analysis.functions[index].signature,
            locals = self.analysis.functions[index].locals.len(),
            "checked function body"
        );
        Ok(())
    }
}
