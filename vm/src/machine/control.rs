use crate::error::{Result, RuntimeError};
use crate::native::NativeCall;

use super::frame::Frame;
use super::stack::StackOps;
use super::vm::{PendingCall, VmState};

/// Trait for call and return instruction handlers
pub trait ControlFlowOps {
    fn call_function(&mut self, index: usize) -> Result<()>;
    fn call_external(&mut self, index: usize) -> Result<()>;
    fn return_from_frame(&mut self) -> Result<()>;
}

impl ControlFlowOps for super::vm::VM {
    fn call_function(&mut self, index: usize) -> Result<()> {
        let code = self
            .functions
            .get(index)
            .ok_or(RuntimeError::FunctionNotFound(index))?;
        let num_params = code.num_params;
        let num_slots = code.locals.len().max(num_params);
        if self.stack.len() < num_params {
            return Err(RuntimeError::StackUnderflow);
        }

        let args = self.stack.split_off(self.stack.len() - num_params);
        let mut frame = Frame::new(index, num_slots, self.stack.len());
        for (slot, arg) in frame.slots.iter_mut().zip(args) {
            *slot = Some(arg);
        }
        self.frames.push(frame);
        Ok(())
    }

    fn call_external(&mut self, index: usize) -> Result<()> {
        let external = self
            .externals
            .function(index)
            .cloned()
            .ok_or(RuntimeError::ExternalNotFound(index))?;
        if self.pending.is_some() {
            return Err(RuntimeError::CallInFlight(external.signature()));
        }
        let arity = external.params.len();
        if self.stack.len() < arity {
            return Err(RuntimeError::StackUnderflow);
        }

        let args = self.stack.split_off(self.stack.len() - arity);
        match (external.native)(&args)? {
            NativeCall::Done(value) => {
                if external.returns_value() {
                    self.push(value);
                }
            }
            NativeCall::Pending(result) => {
                if !external.is_async {
                    return Err(RuntimeError::UnexpectedPending(external.signature()));
                }
                let returns_value = external.returns_value();
                self.suspend(PendingCall {
                    signature: external.signature(),
                    returns_value,
                    result,
                });
            }
        }
        Ok(())
    }

    fn return_from_frame(&mut self) -> Result<()> {
        let frame = self.frames.pop().ok_or(RuntimeError::StackUnderflow)?;
        let returns_value = self
            .functions
            .get(frame.function)
            .ok_or(RuntimeError::FunctionNotFound(frame.function))?
            .returns_value;
        let value = if returns_value { Some(self.pop()?) } else { None };

        // Anything a `return` inside a loop left behind (a repeat counter)
        // belongs to the frame being left.
        self.stack.truncate(frame.stack_base);
        if let Some(value) = value {
            self.push(value);
        }

        if self.frames.is_empty() {
            self.stack.clear();
            self.state = VmState::Completed;
        }
        Ok(())
    }
}
