use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::code::FunctionCode;
use crate::config::VmConfig;
use crate::error::{Result, RuntimeError};
use crate::native::{Completion, ExternalRegistry, PendingResult};
use crate::opcode::Instruction;
use crate::value::Value;

use super::arithmetic::ArithmeticOps;
use super::control::ControlFlowOps;
use super::frame::Frame;
use super::stack::StackOps;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Running,
    Completed,
}

/// Why an execution entry point returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The frame stack is empty.
    Completed,
    /// The next instruction carries a breakpoint for this line.
    Breakpoint(u32),
    /// An async external call has not been answered yet.
    Suspended,
    /// The instruction budget ran out.
    BudgetExhausted,
    /// A single step finished normally.
    Stepped,
}

/// An async call the VM is waiting on.
pub(super) struct PendingCall {
    pub signature: String,
    pub returns_value: bool,
    pub result: PendingResult,
}

/// The Virtual Machine struct
pub struct VM {
    pub(super) functions: Vec<FunctionCode>,
    pub(super) externals: ExternalRegistry,
    pub(super) config: VmConfig,
    pub(super) stack: Vec<Value>,
    pub(super) frames: Vec<Frame>,
    pub(super) state: VmState,
    pub(super) pending: Option<PendingCall>,
    pub(super) breakpoints: BTreeSet<u32>,
}

impl VM {
    /// Create a VM positioned at the first instruction of `$main`.
    pub fn new(functions: Vec<FunctionCode>, externals: ExternalRegistry) -> Self {
        Self::with_config(functions, externals, VmConfig::default())
    }

    pub fn with_config(
        functions: Vec<FunctionCode>,
        externals: ExternalRegistry,
        config: VmConfig,
    ) -> Self {
        let mut vm = Self {
            functions,
            externals,
            config,
            stack: Vec::with_capacity(64),
            frames: Vec::with_capacity(16),
            state: VmState::Completed,
            pending: None,
            breakpoints: BTreeSet::new(),
        };
        vm.rebuild_breakpoints();
        vm.restart();
        vm
    }

    /// Drop all execution state and re-enter `$main`. Breakpoints survive.
    pub fn restart(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.pending = None;
        match self.functions.first() {
            Some(main) => {
                self.frames.push(Frame::new(0, main.locals.len(), 0));
                self.state = VmState::Running;
            }
            None => self.state = VmState::Completed,
        }
        debug!(functions = self.functions.len(), "vm restarted");
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == VmState::Completed
    }

    /// Whether an async call is outstanding.
    pub fn is_suspended(&self) -> bool {
        self.pending.is_some()
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    pub fn functions(&self) -> &[FunctionCode] {
        &self.functions
    }

    pub fn externals(&self) -> &ExternalRegistry {
        &self.externals
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute up to `budget` instructions. Stops early after an instruction
    /// that lands on a breakpoint, or while an async call is outstanding.
    pub fn run(&mut self, budget: usize) -> Result<RunOutcome> {
        if self.is_completed() {
            return Ok(RunOutcome::Completed);
        }
        for _ in 0..budget {
            match self.step()? {
                RunOutcome::Completed => return Ok(RunOutcome::Completed),
                RunOutcome::Suspended => return Ok(RunOutcome::Suspended),
                _ => {}
            }
            if let Some(line) = self.hit_breakpoint() {
                return Ok(RunOutcome::Breakpoint(line));
            }
        }
        Ok(RunOutcome::BudgetExhausted)
    }

    /// Execute a single instruction. While an async call is outstanding this
    /// only polls it; once answered, its value is pushed and the following
    /// instruction runs in the same step.
    pub fn step(&mut self) -> Result<RunOutcome> {
        if self.is_completed() {
            return Ok(RunOutcome::Completed);
        }
        if self.poll_pending() {
            return Ok(RunOutcome::Suspended);
        }
        if self.is_completed() {
            return Ok(RunOutcome::Completed);
        }

        self.execute_one()?;

        if self.is_completed() {
            Ok(RunOutcome::Completed)
        } else {
            Ok(RunOutcome::Stepped)
        }
    }

    /// Returns `true` while the outstanding call is still unanswered.
    fn poll_pending(&mut self) -> bool {
        let Some(call) = self.pending.as_mut() else {
            return false;
        };
        match call.result.poll() {
            None => true,
            Some(Completion::Value(value)) => {
                let returns_value = call.returns_value;
                debug!(call = %call.signature, "async call completed");
                self.pending = None;
                if returns_value {
                    self.push(value);
                }
                false
            }
            Some(Completion::Stop) => {
                debug!(call = %call.signature, "async call stopped the program");
                self.pending = None;
                self.frames.clear();
                self.stack.clear();
                self.state = VmState::Completed;
                false
            }
        }
    }

    pub(super) fn suspend(&mut self, call: PendingCall) {
        debug!(call = %call.signature, "suspended on async call");
        self.pending = Some(call);
    }

    fn execute_one(&mut self) -> Result<()> {
        let Some(frame) = self.frames.last_mut() else {
            self.state = VmState::Completed;
            return Ok(());
        };
        let pc = frame.pc;
        let function = frame.function;
        let code = self
            .functions
            .get(function)
            .ok_or(RuntimeError::FunctionNotFound(function))?;
        let instruction = code
            .instructions
            .get(pc)
            .cloned()
            .ok_or(RuntimeError::PcOutOfRange(pc))?;
        trace!(function = %code.name, pc, %instruction, "dispatch");
        frame.pc += 1;

        match instruction {
            Instruction::Push(value) => self.push(value),
            Instruction::Pop => {
                self.pop()?;
            }
            Instruction::Dup => {
                let top = self.peek()?.clone();
                self.push(top);
            }
            Instruction::Load(slot) => self.load_slot(slot)?,
            Instruction::Store(slot) => {
                let value = self.pop()?;
                self.store_slot(slot, value)?;
            }
            Instruction::LoadField(field) => self.load_field(field)?,
            Instruction::StoreField(field) => self.store_field(field)?,
            Instruction::Jump(offset) => self.jump(pc, offset)?,
            Instruction::JumpIfFalse(offset) => {
                if !self.pop_bool()? {
                    self.jump(pc, offset)?;
                }
            }
            Instruction::Call(index) => self.call_function(index)?,
            Instruction::CallExternal(index) => self.call_external(index)?,
            Instruction::Return => self.return_from_frame()?,
            Instruction::Unary(op) => self.unary(op)?,
            Instruction::Binary(op) => self.binary(op)?,
            Instruction::StringConcat => self.concat()?,
        }
        Ok(())
    }

    fn jump(&mut self, from: usize, offset: isize) -> Result<()> {
        let function = self.frame()?.function;
        let len = self
            .functions
            .get(function)
            .map_or(0, |code| code.instructions.len());
        let target = from as isize + offset;
        if target < 0 || target as usize >= len {
            return Err(RuntimeError::InvalidJump { from, offset });
        }
        self.frame_mut()?.pc = target as usize;
        Ok(())
    }
}
