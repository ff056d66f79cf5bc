//! The compile pipeline: parse, check, emit.

use botlang_parser::ast::{FunctionDecl, Identifier, Program, RecordDecl, Stmt};
use botlang_parser::parse;
use diagnostics::SourceLocation;
use tracing::debug;
use vm::{ExternalRegistry, FunctionCode, VmConfig, VM};

use crate::checker::check;
use crate::emitter::emit;
use crate::error::Result;
use crate::types::TypeTable;

/// Name of the implicit function holding the top-level statements.
pub const MAIN: &str = "$main";

/// A compiled program, ready to be loaded into a `VM`.
#[derive(Debug, Clone)]
pub struct Module {
    /// One code object per function, `$main` at index 0.
    pub code: Vec<FunctionCode>,
    /// Declarations parallel to `code`; `$main` holds the top-level
    /// statements.
    pub functions: Vec<FunctionDecl>,
    pub records: Vec<RecordDecl>,
    pub types: TypeTable,
    /// The host registry plus a constructor for every record type.
    pub externals: ExternalRegistry,
}

impl Module {
    pub fn main(&self) -> &FunctionCode {
        &self.code[0]
    }

    pub fn function(&self, name: &str) -> Option<&FunctionCode> {
        self.code.iter().find(|code| code.name == name)
    }

    /// A fresh VM positioned at the start of `$main`.
    pub fn vm(&self) -> VM {
        VM::new(self.code.clone(), self.externals.clone())
    }

    pub fn vm_with_config(&self, config: VmConfig) -> VM {
        VM::with_config(self.code.clone(), self.externals.clone(), config)
    }
}

/// Compile `source` against the natives and types in `externals`.
pub fn compile(source: &str, externals: &ExternalRegistry) -> Result<Module> {
    let program = parse(source)?;
    debug!(
        statements = program.statements.len(),
        nodes = program.node_count,
        "parsed program"
    );

    let (functions, records) = split_declarations(program);
    let checked = check(&functions, &records, externals)?;
    let code = emit(&functions, &checked.analysis, &checked.types)?;
    debug!(functions = code.len(), "compiled module");

    Ok(Module {
        code,
        functions,
        records,
        types: checked.types,
        externals: checked.externals,
    })
}

/// Pull function and record declarations out of the top level; whatever is
/// left becomes the body of `$main`.
fn split_declarations(program: Program) -> (Vec<FunctionDecl>, Vec<RecordDecl>) {
    let mut functions = Vec::new();
    let mut records = Vec::new();
    let mut body = Vec::new();

    for stmt in program.statements {
        match stmt {
            Stmt::Function(decl) => functions.push(decl),
            Stmt::Record(decl) => records.push(decl),
            other => body.push(other),
        }
    }

    let location = match (body.first(), body.last()) {
        (Some(first), Some(last)) => first.location().join(last.location()),
        _ => SourceLocation::start_of_file(),
    };
    let main = FunctionDecl {
        id: program.node_count,
        name: Identifier {
            name: MAIN.to_string(),
            location: SourceLocation::start_of_file(),
        },
        params: Vec::new(),
        return_type: None,
        body,
        location,
    };
    functions.insert(0, main);
    (functions, records)
}
