use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{RegistryError, RuntimeError};
use crate::native::{ExternalRegistry, Param};
use crate::value::{format_number, Value};

fn arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a Value, RuntimeError> {
    args.get(index).ok_or_else(|| RuntimeError::Native {
        name: name.to_string(),
        message: format!("missing argument {index}"),
    })
}

fn string_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str, RuntimeError> {
    let value = arg(args, index, name)?;
    value.as_str().ok_or_else(|| RuntimeError::mismatch("string", value))
}

fn number_arg(args: &[Value], index: usize, name: &str) -> Result<f64, RuntimeError> {
    let value = arg(args, index, name)?;
    value.as_number().ok_or_else(|| RuntimeError::mismatch("number", value))
}

pub fn native_to_string(args: &[Value]) -> Result<Value, RuntimeError> {
    let value = arg(args, 0, "toString")?;
    let text = match value {
        Value::Number(n) => format_number(*n),
        other => other.to_string(),
    };
    Ok(Value::string(text))
}

pub fn native_length(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg(args, 0, "length")?;
    Ok(Value::Number(s.chars().count() as f64))
}

/// Character at a position, or the empty string when out of range.
pub fn native_char_at(args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg(args, 0, "charAt")?;
    let index = number_arg(args, 1, "charAt")?.floor();
    let ch = if index >= 0.0 {
        s.chars().nth(index as usize)
    } else {
        None
    };
    Ok(Value::string(ch.map(String::from).unwrap_or_default()))
}

/// Uniform number in `[0, 1)`.
pub fn native_random(_args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(rand::random::<f64>()))
}

/// Milliseconds since the Unix epoch.
pub fn native_time(_args: &[Value]) -> Result<Value, RuntimeError> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or_default();
    Ok(Value::Number(millis.floor()))
}

pub fn register_core(registry: &mut ExternalRegistry) -> Result<(), RegistryError> {
    registry.add_sync("toString", vec![Param::new("value", "number")], "string", native_to_string)?;
    registry.add_sync("toString", vec![Param::new("value", "boolean")], "string", native_to_string)?;
    registry.add_sync("length", vec![Param::new("text", "string")], "number", native_length)?;
    registry.add_sync(
        "charAt",
        vec![Param::new("text", "string"), Param::new("index", "number")],
        "string",
        native_char_at,
    )?;
    registry.add_sync("random", vec![], "number", native_random)?;
    registry.add_sync("time", vec![], "number", native_time)?;
    Ok(())
}

/// Register `print` for strings, numbers and booleans, writing each printed
/// line to `sink`.
pub fn register_output(
    registry: &mut ExternalRegistry,
    sink: Rc<dyn Fn(String)>,
) -> Result<(), RegistryError> {
    for type_name in ["string", "number", "boolean"] {
        let sink = Rc::clone(&sink);
        registry.add_sync("print", vec![Param::new("value", type_name)], "nothing", move |args| {
            sink(arg(args, 0, "print")?.to_string());
            Ok(Value::Nothing)
        })?;
    }
    Ok(())
}
