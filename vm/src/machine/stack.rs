use std::rc::Rc;

use crate::error::{Result, RuntimeError};
use crate::value::{RecordValue, Value};

use super::frame::Frame;

/// Trait for operand stack, slot and field access
pub trait StackOps {
    fn push(&mut self, value: Value);
    fn pop(&mut self) -> Result<Value>;
    fn peek(&self) -> Result<&Value>;
    fn pop_number(&mut self) -> Result<f64>;
    fn pop_bool(&mut self) -> Result<bool>;
    fn pop_string(&mut self) -> Result<Rc<str>>;
    fn pop_record(&mut self) -> Result<Rc<RecordValue>>;

    fn frame(&self) -> Result<&Frame>;
    fn frame_mut(&mut self) -> Result<&mut Frame>;

    fn load_slot(&mut self, slot: usize) -> Result<()>;
    fn store_slot(&mut self, slot: usize, value: Value) -> Result<()>;
    fn load_field(&mut self, field: usize) -> Result<()>;
    fn store_field(&mut self, field: usize) -> Result<()>;
}

impl StackOps for super::vm::VM {
    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn peek(&self) -> Result<&Value> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop_number(&mut self) -> Result<f64> {
        match self.pop()? {
            Value::Number(n) => Ok(n),
            other => Err(RuntimeError::mismatch("number", &other)),
        }
    }

    fn pop_bool(&mut self) -> Result<bool> {
        match self.pop()? {
            Value::Boolean(b) => Ok(b),
            other => Err(RuntimeError::mismatch("boolean", &other)),
        }
    }

    fn pop_string(&mut self) -> Result<Rc<str>> {
        match self.pop()? {
            Value::String(s) => Ok(s),
            other => Err(RuntimeError::mismatch("string", &other)),
        }
    }

    fn pop_record(&mut self) -> Result<Rc<RecordValue>> {
        match self.pop()? {
            Value::Record(r) => Ok(r),
            other => Err(RuntimeError::mismatch("record", &other)),
        }
    }

    fn frame(&self) -> Result<&Frame> {
        self.frames.last().ok_or(RuntimeError::StackUnderflow)
    }

    fn frame_mut(&mut self) -> Result<&mut Frame> {
        self.frames.last_mut().ok_or(RuntimeError::StackUnderflow)
    }

    fn load_slot(&mut self, slot: usize) -> Result<()> {
        let frame = self.frame()?;
        let value = match frame.slots.get(slot) {
            Some(Some(value)) => value.clone(),
            Some(None) => {
                return Err(RuntimeError::UninitializedSlot {
                    function: self.functions[frame.function].name.clone(),
                    slot,
                })
            }
            None => {
                return Err(RuntimeError::SlotOutOfRange {
                    function: self.functions[frame.function].name.clone(),
                    slot,
                })
            }
        };
        self.push(value);
        Ok(())
    }

    fn store_slot(&mut self, slot: usize, value: Value) -> Result<()> {
        let frame = self.frames.last_mut().ok_or(RuntimeError::StackUnderflow)?;
        match frame.slots.get_mut(slot) {
            Some(entry) => {
                *entry = Some(value);
                Ok(())
            }
            None => Err(RuntimeError::SlotOutOfRange {
                function: self.functions[frame.function].name.clone(),
                slot,
            }),
        }
    }

    fn load_field(&mut self, field: usize) -> Result<()> {
        let record = self.pop_record()?;
        let value = record
            .fields
            .borrow()
            .get(field)
            .cloned()
            .ok_or_else(|| RuntimeError::FieldOutOfRange {
                record: record.type_name.to_string(),
                field,
            })?;
        self.push(value);
        Ok(())
    }

    fn store_field(&mut self, field: usize) -> Result<()> {
        let value = self.pop()?;
        let record = self.pop_record()?;
        let mut fields = record.fields.borrow_mut();
        match fields.get_mut(field) {
            Some(entry) => {
                *entry = value;
                Ok(())
            }
            None => Err(RuntimeError::FieldOutOfRange {
                record: record.type_name.to_string(),
                field,
            }),
        }
    }
}
