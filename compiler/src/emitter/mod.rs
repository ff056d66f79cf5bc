//! Bytecode emission from the checked AST.

use botlang_parser::ast::{FunctionDecl, NodeId, Stmt};
use diagnostics::{Position, SourceLocation};
use tracing::debug;
use vm::{FunctionCode, Instruction, LineInfo, LocalSlot, Liveness, Value};

use crate::checker::{Analysis, CallTarget};
use crate::error::{CompileError, Result};
use crate::types::{TypeId, TypeTable};

pub mod control_flow;
pub mod expressions;
pub mod statements;

pub use control_flow::ControlFlowEmitter;
pub use expressions::ExpressionEmitter;
pub use statements::StatementEmitter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    While,
    Repeat,
}

#[derive(Debug, Clone)]
pub struct LoopContext {
    pub kind: LoopKind,
    /// Where `continue` goes, once known. The decrement step of a `repeat`
    /// is emitted after its body, so those jumps are patched later.
    pub continue_target: Option<usize>,
    pub continue_jumps: Vec<usize>,
    pub break_jumps: Vec<usize>,
}

/// State specific to ONE function being emitted
#[derive(Debug, Default)]
pub struct FunctionEmitter {
    pub instructions: Vec<Instruction>,
    pub line_infos: Vec<LineInfo>,
    pub loop_stack: Vec<LoopContext>,
    /// Liveness per slot, filled in as declarations are emitted.
    pub liveness: Vec<Option<Liveness>>,
    /// Slots declared in each open block, closed when the block ends.
    pub blocks: Vec<Vec<usize>>,
    /// While set, every emitted instruction is attributed to this location
    /// (the enclosing simple statement or branch condition).
    pub anchor: Option<SourceLocation>,
}

impl FunctionEmitter {
    fn new(num_slots: usize) -> Self {
        Self {
            liveness: vec![None; num_slots],
            blocks: vec![Vec::new()],
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn emit(&mut self, instruction: Instruction, location: SourceLocation) -> usize {
        let location = self.anchor.unwrap_or(location);
        self.instructions.push(instruction);
        self.line_infos.push(LineInfo::new(location));
        self.instructions.len() - 1
    }

    /// Emit on the line of the previous instruction, or at `fallback` when
    /// there is none.
    pub fn emit_continuing(&mut self, instruction: Instruction, fallback: SourceLocation) -> usize {
        let location = self.line_infos.last().map_or(fallback, |info| info.location);
        self.emit(instruction, location)
    }

    /// Whether control can run past the last instruction.
    fn falls_off_end(&self) -> bool {
        let end = self.instructions.len() as isize;
        let Some(last) = self.instructions.last() else {
            return true;
        };
        if last.falls_through() {
            return true;
        }
        self.instructions
            .iter()
            .enumerate()
            .any(|(index, instruction)| match instruction {
                Instruction::Jump(offset) | Instruction::JumpIfFalse(offset) => {
                    index as isize + offset == end
                }
                _ => false,
            })
    }
}

pub struct Emitter<'a> {
    pub(crate) analysis: &'a Analysis,
    pub(crate) types: &'a TypeTable,
    pub(crate) function: FunctionEmitter,
}

/// Emit one code object per function, `$main` first.
pub fn emit(
    functions: &[FunctionDecl],
    analysis: &Analysis,
    types: &TypeTable,
) -> Result<Vec<FunctionCode>> {
    let mut emitter = Emitter::new(analysis, types);
    functions
        .iter()
        .enumerate()
        .map(|(index, decl)| emitter.emit_function(index, decl))
        .collect()
}

impl<'a> Emitter<'a> {
    pub fn new(analysis: &'a Analysis, types: &'a TypeTable) -> Self {
        Self {
            analysis,
            types,
            function: FunctionEmitter::default(),
        }
    }

    pub fn emit_function(&mut self, index: usize, decl: &FunctionDecl) -> Result<FunctionCode> {
        let analysis = self.analysis;
        let info = analysis
            .functions
            .get(index)
            .ok_or_else(|| CompileError::new("Function was not checked.", decl.name.location))?;
        self.function = FunctionEmitter::new(info.locals.len());

        for stmt in &decl.body {
            self.emit_stmt(stmt)?;
        }

        if self.function.falls_off_end() {
            let location = implicit_return_location(index, decl);
            if info.returns_value() {
                let default = default_value(self.types, info.return_type);
                self.function.emit(Instruction::Push(default), location);
            }
            self.function.emit(Instruction::Return, location);
        }

        let last = self.function.len().saturating_sub(1);
        self.close_block();
        for param in 0..decl.params.len() {
            if let Some(live) = self.function.liveness.get_mut(param) {
                *live = Some(Liveness { start: 0, end: last });
            }
        }

        let function = std::mem::take(&mut self.function);
        let locals = info
            .locals
            .iter()
            .zip(&function.liveness)
            .map(|(symbol, live)| LocalSlot {
                name: symbol.name.clone(),
                type_name: self.types.name(symbol.ty),
                declared_at: symbol.location,
                // A declaration that never got emitted is never live.
                live: live.unwrap_or(Liveness { start: 1, end: 0 }),
            })
            .collect();

        let breakpoints = vec![None; function.instructions.len()];
        debug!(
            function = %info.signature,
            instructions = function.instructions.len(),
            "emitted function"
        );
        Ok(FunctionCode {
            name: info.name.clone(),
            signature: info.signature.clone(),
            declaration: index,
            location: (index > 0).then_some(decl.location),
            num_params: decl.params.len(),
            returns_value: info.returns_value(),
            instructions: function.instructions,
            line_infos: function.line_infos,
            locals,
            breakpoints,
        })
    }

    /// Run `emit` with every instruction it emits attributed to `location`.
    pub(crate) fn anchored<T>(
        &mut self,
        location: SourceLocation,
        emit: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let previous = self.function.anchor.replace(location);
        let result = emit(self);
        self.function.anchor = previous;
        result
    }

    pub(crate) fn open_block(&mut self) {
        self.function.blocks.push(Vec::new());
    }

    /// End every variable declared in the innermost block at the block's
    /// last instruction.
    pub(crate) fn close_block(&mut self) {
        let end = self.function.len().saturating_sub(1);
        let Some(slots) = self.function.blocks.pop() else {
            return;
        };
        for slot in slots {
            if let Some(Some(live)) = self.function.liveness.get_mut(slot) {
                live.end = end;
            }
        }
    }

    /// A variable's value is visible from the instruction after its store.
    pub(crate) fn declare_slot(&mut self, slot: usize) {
        let start = self.function.len();
        if let Some(live) = self.function.liveness.get_mut(slot) {
            *live = Some(Liveness { start, end: start });
        }
        if let Some(block) = self.function.blocks.last_mut() {
            block.push(slot);
        }
    }

    pub(crate) fn slot_of(&self, id: NodeId, location: SourceLocation) -> Result<usize> {
        self.analysis
            .slots
            .get(&id)
            .copied()
            .ok_or_else(|| CompileError::new("Unresolved variable.", location))
    }

    pub(crate) fn call_target(&self, id: NodeId, location: SourceLocation) -> Result<CallTarget> {
        self.analysis
            .calls
            .get(&id)
            .copied()
            .ok_or_else(|| CompileError::new("Unresolved function call.", location))
    }

    pub(crate) fn emit_call(&mut self, target: CallTarget, location: SourceLocation) {
        let instruction = match target {
            CallTarget::Function(index) => Instruction::Call(index),
            CallTarget::External(index) => Instruction::CallExternal(index),
        };
        self.function.emit(instruction, location);
    }
}

/// Functions return at their `end`; `$main` after its last statement.
fn implicit_return_location(index: usize, decl: &FunctionDecl) -> SourceLocation {
    let end: Position = if index > 0 {
        decl.location.end
    } else {
        match decl.body.iter().rev().find(|s| !matches!(s, Stmt::Comment { .. })) {
            Some(stmt) => stmt.location().end,
            None => return SourceLocation::start_of_file(),
        }
    };
    SourceLocation::new(end, end)
}

/// What a value-returning function hands back when it runs off its end.
fn default_value(types: &TypeTable, ty: TypeId) -> Value {
    match ty {
        TypeTable::NUMBER => Value::Number(0.0),
        TypeTable::BOOLEAN => Value::Boolean(false),
        TypeTable::STRING => Value::string(""),
        _ => {
            debug!(ty = %types.name(ty), "no default value, returning nothing");
            Value::Nothing
        }
    }
}
