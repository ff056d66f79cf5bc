//! Machine module - VM implementation
//!
//! The VM is split into focused submodules: the state and dispatch loop,
//! operand stack helpers, operators, calls and returns, and the debugger
//! protocol (stepping, breakpoints, introspection).

mod arithmetic;
mod control;
mod debug;
mod frame;
mod stack;
mod vm;

// Public API
pub use debug::{FrameView, LocalView, StepOverSnapshot};
pub use frame::Frame;
pub use vm::{RunOutcome, VmState, VM};
