//! Host-provided ("external") functions and types.
//!
//! A native either finishes immediately with `NativeCall::Done`, or returns a
//! `PendingResult` whose `Resolver` the host keeps. The VM polls the pending
//! result between instructions and stays suspended until the host completes
//! or stops it.

use std::fmt;
use std::rc::Rc;

use tokio::sync::oneshot::{self, error::TryRecvError};

use crate::error::{RegistryError, RuntimeError};
use crate::value::Value;

/// The unified signature for every external implementation.
pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<NativeCall, RuntimeError>>;

pub enum NativeCall {
    Done(Value),
    Pending(PendingResult),
}

/// A named, typed parameter or record field. Types are referenced by name
/// and resolved by the compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub type_name: String,
}

impl Param {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

#[derive(Clone)]
pub struct ExternalFunction {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: String,
    pub is_async: bool,
    pub native: NativeFn,
}

impl ExternalFunction {
    /// `name(type,...)`, the key calls are resolved by.
    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.params.iter().map(|p| p.type_name.as_str()).collect();
        format!("{}({})", self.name, params.join(","))
    }

    /// `name(type,...):type`, the key duplicate declarations are rejected by.
    pub fn full_signature(&self) -> String {
        format!("{}:{}", self.signature(), self.return_type)
    }

    pub fn returns_value(&self) -> bool {
        self.return_type != "nothing"
    }
}

impl fmt::Debug for ExternalFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalFunction")
            .field("signature", &self.full_signature())
            .field("is_async", &self.is_async)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalType {
    pub name: String,
    pub fields: Vec<Param>,
    /// Whether scripts may build values of this type with `Name(fields...)`.
    pub generate_constructor: bool,
}

/// Natives and record types the host exposes to scripts.
#[derive(Debug, Clone, Default)]
pub struct ExternalRegistry {
    functions: Vec<ExternalFunction>,
    types: Vec<ExternalType>,
}

impl ExternalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(
        &mut self,
        name: &str,
        params: Vec<Param>,
        return_type: &str,
        is_async: bool,
        native: NativeFn,
    ) -> Result<usize, RegistryError> {
        let function = ExternalFunction {
            name: name.to_string(),
            params,
            return_type: return_type.to_string(),
            is_async,
            native,
        };
        let full = function.full_signature();
        if self.functions.iter().any(|f| f.full_signature() == full) {
            return Err(RegistryError::DuplicateFunction(full));
        }
        self.functions.push(function);
        Ok(self.functions.len() - 1)
    }

    /// Convenience for synchronous natives that always produce a value.
    pub fn add_sync(
        &mut self,
        name: &str,
        params: Vec<Param>,
        return_type: &str,
        native: impl Fn(&[Value]) -> Result<Value, RuntimeError> + 'static,
    ) -> Result<usize, RegistryError> {
        self.add_function(
            name,
            params,
            return_type,
            false,
            Rc::new(move |args: &[Value]| native(args).map(NativeCall::Done)),
        )
    }

    pub fn add_type(
        &mut self,
        name: &str,
        fields: Vec<Param>,
        generate_constructor: bool,
    ) -> Result<(), RegistryError> {
        if self.types.iter().any(|t| t.name == name) {
            return Err(RegistryError::DuplicateType(name.to_string()));
        }
        self.types.push(ExternalType {
            name: name.to_string(),
            fields,
            generate_constructor,
        });
        Ok(())
    }

    /// First declared function whose name and parameter types match.
    pub fn lookup(&self, name: &str, param_types: &[&str]) -> Option<(usize, &ExternalFunction)> {
        self.functions.iter().enumerate().find(|(_, f)| {
            f.name == name
                && f.params.len() == param_types.len()
                && f.params.iter().zip(param_types).all(|(p, t)| p.type_name == *t)
        })
    }

    pub fn function(&self, index: usize) -> Option<&ExternalFunction> {
        self.functions.get(index)
    }

    pub fn functions(&self) -> &[ExternalFunction] {
        &self.functions
    }

    pub fn types(&self) -> &[ExternalType] {
        &self.types
    }
}

// ============================================================================
// Async completion
// ============================================================================

/// What the host reports for a pending call.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Value(Value),
    /// Abandon the program, e.g. the learner pressed "stop" in a dialog.
    Stop,
}

/// Host side of a pending call.
#[derive(Debug)]
pub struct Resolver {
    sender: oneshot::Sender<Completion>,
}

impl Resolver {
    pub fn complete(self, value: Value) {
        // The VM may have been restarted or dropped, nobody is waiting then.
        let _ = self.sender.send(Completion::Value(value));
    }

    pub fn stop(self) {
        let _ = self.sender.send(Completion::Stop);
    }
}

/// VM side of a pending call.
#[derive(Debug)]
pub struct PendingResult {
    receiver: oneshot::Receiver<Completion>,
}

impl PendingResult {
    /// `None` while the host has not answered yet. A dropped resolver counts
    /// as `Stop`.
    pub fn poll(&mut self) -> Option<Completion> {
        match self.receiver.try_recv() {
            Ok(completion) => Some(completion),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Completion::Stop),
        }
    }
}

/// Create a linked resolver / pending-result pair.
pub fn pending() -> (Resolver, PendingResult) {
    let (sender, receiver) = oneshot::channel();
    (Resolver { sender }, PendingResult { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> NativeFn {
        Rc::new(|_| Ok(NativeCall::Done(Value::Nothing)))
    }

    #[test]
    fn duplicate_full_signature_is_rejected() {
        let mut registry = ExternalRegistry::new();
        registry
            .add_function("alert", vec![Param::new("msg", "string")], "nothing", false, noop())
            .unwrap();
        let err = registry
            .add_function("alert", vec![Param::new("text", "string")], "nothing", false, noop())
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateFunction("alert(string):nothing".into()));
    }

    #[test]
    fn overloads_differ_by_parameter_types() {
        let mut registry = ExternalRegistry::new();
        registry
            .add_function("alert", vec![Param::new("v", "string")], "nothing", false, noop())
            .unwrap();
        registry
            .add_function("alert", vec![Param::new("v", "number")], "nothing", false, noop())
            .unwrap();
        let (index, f) = registry.lookup("alert", &["number"]).unwrap();
        assert_eq!(index, 1);
        assert_eq!(f.signature(), "alert(number)");
        assert!(registry.lookup("alert", &["boolean"]).is_none());
    }

    #[test]
    fn lookup_ignores_return_type_and_prefers_first() {
        let mut registry = ExternalRegistry::new();
        registry.add_function("f", vec![], "number", false, noop()).unwrap();
        registry.add_function("f", vec![], "string", false, noop()).unwrap();
        let (index, f) = registry.lookup("f", &[]).unwrap();
        assert_eq!(index, 0);
        assert_eq!(f.return_type, "number");
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let mut registry = ExternalRegistry::new();
        registry.add_type("Color", vec![Param::new("r", "number")], true).unwrap();
        assert_eq!(
            registry.add_type("Color", vec![], false),
            Err(RegistryError::DuplicateType("Color".into()))
        );
    }

    #[test]
    fn pending_result_reports_completion() {
        let (resolver, mut result) = pending();
        assert_eq!(result.poll(), None);
        resolver.complete(Value::Number(3.0));
        assert_eq!(result.poll(), Some(Completion::Value(Value::Number(3.0))));
    }

    #[test]
    fn dropped_resolver_counts_as_stop() {
        let (resolver, mut result) = pending();
        drop(resolver);
        assert_eq!(result.poll(), Some(Completion::Stop));
    }
}
