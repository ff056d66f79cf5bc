use thiserror::Error;

/// Engine invariant violations. A type-checked module never produces these;
/// seeing one means the compiler or a native is broken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("operand stack underflow")]
    StackUnderflow,
    #[error("slot {slot} of {function} read before it was written")]
    UninitializedSlot { function: String, slot: usize },
    #[error("slot {slot} out of range in {function}")]
    SlotOutOfRange { function: String, slot: usize },
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("function index {0} out of range")]
    FunctionNotFound(usize),
    #[error("external function index {0} out of range")]
    ExternalNotFound(usize),
    #[error("field {field} out of range for record {record}")]
    FieldOutOfRange { record: String, field: usize },
    #[error("jump from {from} by {offset} leaves the function")]
    InvalidJump { from: usize, offset: isize },
    #[error("program counter {0} past the end of the function")]
    PcOutOfRange(usize),
    #[error("external call to {0} issued while another call is still pending")]
    CallInFlight(String),
    #[error("synchronous external {0} returned a pending result")]
    UnexpectedPending(String),
    #[error("native {name} failed: {message}")]
    Native { name: String, message: String },
}

impl RuntimeError {
    pub fn mismatch(expected: &'static str, found: &crate::value::Value) -> Self {
        RuntimeError::TypeMismatch {
            expected,
            found: found.kind_name(),
        }
    }
}

/// Rejected host declarations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("external function {0} is already declared")]
    DuplicateFunction(String),
    #[error("external type {0} is already declared")]
    DuplicateType(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
