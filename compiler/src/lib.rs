pub mod checker;
pub mod dump;
pub mod emitter;
pub mod error;
pub mod module;
pub mod scopes;
pub mod types;

pub use checker::{check, Analysis, CallTarget, Checked};
pub use dump::{module_to_json, module_to_string};
pub use emitter::emit;
pub use error::CompileError;
pub use module::{compile, Module, MAIN};
pub use types::{Type, TypeId, TypeTable};
