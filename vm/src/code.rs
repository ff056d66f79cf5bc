//! Compiled function objects.

use diagnostics::SourceLocation;
use serde::Serialize;

use crate::opcode::Instruction;

/// Bytecode for one function. Index 0 of a module is always `$main`.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionCode {
    pub name: String,
    /// `name(type,...)` plus `:type` when the function returns a value.
    pub signature: String,
    /// Index of the function's declaration in the module's function list.
    pub declaration: usize,
    /// Source span of the declaration; `None` for `$main`.
    pub location: Option<SourceLocation>,
    pub num_params: usize,
    pub returns_value: bool,
    pub instructions: Vec<Instruction>,
    /// Parallel to `instructions`.
    pub line_infos: Vec<LineInfo>,
    /// One entry per slot, parameters first.
    pub locals: Vec<LocalSlot>,
    /// Parallel to `instructions`; rebuilt by the VM when breakpoints change.
    #[serde(skip)]
    pub breakpoints: Vec<Option<Breakpoint>>,
}

/// Where an instruction came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineInfo {
    pub line: u32,
    pub location: SourceLocation,
}

impl LineInfo {
    pub fn new(location: SourceLocation) -> Self {
        Self {
            line: location.start.line,
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalSlot {
    pub name: String,
    pub type_name: String,
    pub declared_at: SourceLocation,
    pub live: Liveness,
}

/// Instruction range `[start, end]` during which a slot holds a meaningful
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Liveness {
    pub start: usize,
    pub end: usize,
}

impl Liveness {
    pub fn contains(&self, pc: usize) -> bool {
        self.start <= pc && pc <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub line: u32,
}

impl FunctionCode {
    pub fn is_main(&self) -> bool {
        self.declaration == 0
    }

    pub fn line_at(&self, pc: usize) -> Option<u32> {
        self.line_infos.get(pc).map(|info| info.line)
    }

    /// Whether a breakpoint on `line` belongs to this function.
    pub fn owns_line(&self, line: u32) -> bool {
        match &self.location {
            None => true,
            Some(location) => location.covers_line(line),
        }
    }

    /// Rebuild the breakpoint table: each line maps to the first instruction
    /// generated from it.
    pub fn resolve_breakpoints<'a>(&mut self, lines: impl IntoIterator<Item = &'a u32>) {
        self.breakpoints = vec![None; self.instructions.len()];
        for &line in lines {
            if !self.owns_line(line) {
                continue;
            }
            if let Some(pc) = self.line_infos.iter().position(|info| info.line == line) {
                self.breakpoints[pc] = Some(Breakpoint { line });
            }
        }
    }
}
