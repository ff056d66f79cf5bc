use crate::error::Result;
use crate::opcode::{BinaryOperator, UnaryOperator};
use crate::value::Value;

use super::stack::StackOps;

/// Trait for operator instruction handlers
pub trait ArithmeticOps {
    fn unary(&mut self, op: UnaryOperator) -> Result<()>;
    fn binary(&mut self, op: BinaryOperator) -> Result<()>;
    fn concat(&mut self) -> Result<()>;
}

impl ArithmeticOps for super::vm::VM {
    fn unary(&mut self, op: UnaryOperator) -> Result<()> {
        let result = match op {
            UnaryOperator::Not => Value::Boolean(!self.pop_bool()?),
            UnaryOperator::Negate => Value::Number(-self.pop_number()?),
        };
        self.push(result);
        Ok(())
    }

    fn binary(&mut self, op: BinaryOperator) -> Result<()> {
        let result = match op {
            BinaryOperator::Eq | BinaryOperator::Ne => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                Value::Boolean((lhs == rhs) == (op == BinaryOperator::Eq))
            }
            BinaryOperator::And => logical(self, |lhs, rhs| lhs && rhs)?,
            BinaryOperator::Or => logical(self, |lhs, rhs| lhs || rhs)?,
            BinaryOperator::Xor => logical(self, |lhs, rhs| lhs != rhs)?,
            BinaryOperator::Add => Value::Number(numeric(self, |lhs, rhs| lhs + rhs)?),
            BinaryOperator::Sub => Value::Number(numeric(self, |lhs, rhs| lhs - rhs)?),
            BinaryOperator::Mul => Value::Number(numeric(self, |lhs, rhs| lhs * rhs)?),
            BinaryOperator::Div => Value::Number(numeric(self, |lhs, rhs| lhs / rhs)?),
            BinaryOperator::Lt => Value::Boolean(numeric(self, |lhs, rhs| lhs < rhs)?),
            BinaryOperator::Le => Value::Boolean(numeric(self, |lhs, rhs| lhs <= rhs)?),
            BinaryOperator::Gt => Value::Boolean(numeric(self, |lhs, rhs| lhs > rhs)?),
            BinaryOperator::Ge => Value::Boolean(numeric(self, |lhs, rhs| lhs >= rhs)?),
        };
        self.push(result);
        Ok(())
    }

    fn concat(&mut self) -> Result<()> {
        let rhs = self.pop_string()?;
        let lhs = self.pop_string()?;
        let mut joined = String::with_capacity(lhs.len() + rhs.len());
        joined.push_str(&lhs);
        joined.push_str(&rhs);
        self.push(Value::string(joined));
        Ok(())
    }
}

/// Pop two numbers (right operand on top) and combine them.
fn numeric<T>(vm: &mut super::vm::VM, op: impl FnOnce(f64, f64) -> T) -> Result<T> {
    let rhs = vm.pop_number()?;
    let lhs = vm.pop_number()?;
    Ok(op(lhs, rhs))
}

fn logical(vm: &mut super::vm::VM, op: impl FnOnce(bool, bool) -> bool) -> Result<Value> {
    let rhs = vm.pop_bool()?;
    let lhs = vm.pop_bool()?;
    Ok(Value::Boolean(op(lhs, rhs)))
}
