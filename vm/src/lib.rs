pub mod code;
pub mod config;
pub mod error;
pub mod machine;
pub mod native;
pub mod opcode;
pub mod stdlib;
pub mod value;

pub use code::{Breakpoint, FunctionCode, Liveness, LineInfo, LocalSlot};
pub use config::VmConfig;
pub use error::{RegistryError, RuntimeError};
pub use machine::{Frame, FrameView, LocalView, RunOutcome, StepOverSnapshot, VmState, VM};
pub use native::{
    pending, Completion, ExternalFunction, ExternalRegistry, ExternalType, NativeCall, NativeFn,
    Param, PendingResult, Resolver,
};
pub use opcode::{BinaryOperator, Instruction, UnaryOperator};
pub use value::{RecordValue, Value};
