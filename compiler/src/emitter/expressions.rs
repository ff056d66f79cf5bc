use botlang_parser::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use vm::{BinaryOperator, Instruction, UnaryOperator, Value};

use crate::error::{CompileError, Result};

use super::Emitter;

pub trait ExpressionEmitter {
    /// Leave the value of `expr` on the operand stack (nothing for calls
    /// returning `nothing`).
    fn emit_expr(&mut self, expr: &Expr) -> Result<()>;
    fn emit_binary(&mut self, expr: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<()>;
}

fn binary_operator(op: BinaryOp) -> Option<BinaryOperator> {
    Some(match op {
        BinaryOp::Add => BinaryOperator::Add,
        BinaryOp::Sub => BinaryOperator::Sub,
        BinaryOp::Mul => BinaryOperator::Mul,
        BinaryOp::Div => BinaryOperator::Div,
        BinaryOp::Lt => BinaryOperator::Lt,
        BinaryOp::Le => BinaryOperator::Le,
        BinaryOp::Gt => BinaryOperator::Gt,
        BinaryOp::Ge => BinaryOperator::Ge,
        BinaryOp::Eq => BinaryOperator::Eq,
        BinaryOp::Ne => BinaryOperator::Ne,
        BinaryOp::And => BinaryOperator::And,
        BinaryOp::Or => BinaryOperator::Or,
        BinaryOp::Xor => BinaryOperator::Xor,
        BinaryOp::Concat => return None,
    })
}

impl ExpressionEmitter for Emitter<'_> {
    fn emit_expr(&mut self, expr: &Expr) -> Result<()> {
        let location = expr.location;
        match &expr.kind {
            ExprKind::Number(n) => {
                self.function.emit(Instruction::Push(Value::Number(*n)), location);
            }
            ExprKind::Boolean(b) => {
                self.function.emit(Instruction::Push(Value::Boolean(*b)), location);
            }
            ExprKind::String(s) => {
                self.function.emit(Instruction::Push(Value::string(s)), location);
            }
            ExprKind::List(_) | ExprKind::Index { .. } => {
                return Err(CompileError::new(
                    "Lists and array access are not implemented yet.",
                    location,
                ))
            }
            ExprKind::Unary { op, operand } => {
                self.emit_expr(operand)?;
                let op = match op {
                    UnaryOp::Not => UnaryOperator::Not,
                    UnaryOp::Negate => UnaryOperator::Negate,
                };
                self.function.emit(Instruction::Unary(op), location);
            }
            ExprKind::Binary { op, lhs, rhs } => self.emit_binary(expr, *op, lhs, rhs)?,
            ExprKind::Variable(_) => {
                let slot = self.slot_of(expr.id, location)?;
                self.function.emit(Instruction::Load(slot), location);
            }
            ExprKind::Field { record, .. } => {
                let field = self
                    .analysis
                    .fields
                    .get(&expr.id)
                    .copied()
                    .ok_or_else(|| CompileError::new("Unresolved field.", location))?;
                self.emit_expr(record)?;
                self.function.emit(Instruction::LoadField(field), location);
            }
            ExprKind::Call { args, .. } => {
                let target = self.call_target(expr.id, location)?;
                for arg in args {
                    self.emit_expr(arg)?;
                }
                self.emit_call(target, location);
            }
        }
        Ok(())
    }

    fn emit_binary(&mut self, expr: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> Result<()> {
        self.emit_expr(lhs)?;
        self.emit_expr(rhs)?;

        // Records with an `equals` compare through it.
        if let Some(&target) = self.analysis.equals.get(&expr.id) {
            self.emit_call(target, expr.location);
            if op == BinaryOp::Ne {
                self.function
                    .emit(Instruction::Unary(UnaryOperator::Not), expr.location);
            }
            return Ok(());
        }

        let instruction = match binary_operator(op) {
            Some(op) => Instruction::Binary(op),
            None => Instruction::StringConcat,
        };
        self.function.emit(instruction, expr.location);
        Ok(())
    }
}
