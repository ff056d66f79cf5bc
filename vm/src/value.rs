//! Runtime values.
//!
//! Strings are immutable and shared. Records are shared and mutable: two
//! variables holding the same record see each other's field stores, and
//! `==` on records compares identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nothing,
    Boolean(bool),
    Number(f64),
    String(Rc<str>),
    Record(Rc<RecordValue>),
}

#[derive(Debug)]
pub struct RecordValue {
    pub type_name: Rc<str>,
    pub field_names: Rc<[String]>,
    pub fields: RefCell<Vec<Value>>,
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn record(type_name: Rc<str>, field_names: Rc<[String]>, fields: Vec<Value>) -> Self {
        Value::Record(Rc::new(RecordValue {
            type_name,
            field_names,
            fields: RefCell::new(fields),
        }))
    }

    /// Name of the runtime kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nothing => "nothing",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Record(_) => "record",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nothing, Value::Nothing) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Numbers print without a trailing `.0`, the way learners write them.
pub fn format_number(n: f64) -> String {
    if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nothing => write!(f, "nothing"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{s}"),
            Value::Record(r) => {
                write!(f, "{}{{", r.type_name)?;
                for (i, (name, value)) in r.field_names.iter().zip(r.fields.borrow().iter()).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Nothing => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::String(s) => serializer.serialize_str(s),
            Value::Record(r) => {
                let fields = r.fields.borrow();
                let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
                map.serialize_entry("$type", &*r.type_name)?;
                for (name, value) in r.field_names.iter().zip(fields.iter()) {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64, y: f64) -> Value {
        Value::record(
            Rc::from("Point"),
            Rc::from(vec!["x".to_string(), "y".to_string()]),
            vec![Value::Number(x), Value::Number(y)],
        )
    }

    #[test]
    fn numbers_print_like_source() {
        assert_eq!(Value::Number(1.0).to_string(), "1");
        assert_eq!(Value::Number(34.56).to_string(), "34.56");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "Infinity");
    }

    #[test]
    fn negative_zero_prints_without_sign() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(Value::Number(-0.0).to_string(), "0");
    }

    #[test]
    fn records_compare_by_identity() {
        let a = point(1.0, 2.0);
        let b = point(1.0, 2.0);
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn record_display_lists_fields() {
        assert_eq!(point(1.0, 2.5).to_string(), "Point{x: 1, y: 2.5}");
    }

    #[test]
    fn strings_compare_by_content() {
        assert_eq!(Value::string("ab"), Value::string(String::from("a") + "b"));
    }
}
