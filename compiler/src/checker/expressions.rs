use botlang_parser::ast::{BinaryOp, Expr, ExprKind, Identifier, UnaryOp};

use crate::error::{CompileError, Result};
use crate::types::{TypeId, TypeTable};

use super::{CallTarget, Checker};

pub trait ExpressionChecker {
    /// Type of `expr`, recorded in the side table.
    fn check_expr(&mut self, expr: &Expr) -> Result<TypeId>;
    /// Like `check_expr`, but the expression must produce a value.
    fn check_value(&mut self, expr: &Expr) -> Result<TypeId>;
    fn check_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<TypeId>;
    fn check_binary(&mut self, expr: &Expr, op: BinaryOp, lhs: &Expr, rhs: &Expr)
        -> Result<TypeId>;
    fn check_field(&mut self, record: &Expr, name: &Identifier) -> Result<(TypeId, usize)>;
    fn check_call(&mut self, expr: &Expr, name: &Identifier, args: &[Expr]) -> Result<TypeId>;
    /// The `equals(T,T):boolean` a record comparison compiles to, if any.
    fn find_equals(&self, ty: TypeId) -> Option<CallTarget>;
}

impl ExpressionChecker for Checker<'_> {
    fn check_expr(&mut self, expr: &Expr) -> Result<TypeId> {
        let ty = match &expr.kind {
            ExprKind::Number(_) => TypeTable::NUMBER,
            ExprKind::Boolean(_) => TypeTable::BOOLEAN,
            ExprKind::String(_) => TypeTable::STRING,
            ExprKind::List(_) => {
                return Err(CompileError::new(
                    "List literals are not implemented yet.",
                    expr.location,
                ))
            }
            ExprKind::Index { .. } => {
                return Err(CompileError::new(
                    "Array access is not implemented yet.",
                    expr.location,
                ))
            }
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand)?,
            ExprKind::Binary { op, lhs, rhs } => self.check_binary(expr, *op, lhs, rhs)?,
            ExprKind::Variable(name) => {
                let symbol = self.scopes.resolve(&name.name).ok_or_else(|| {
                    CompileError::new(
                        format!(
                            "Can not find variable or parameter with name '{}'.",
                            name.name
                        ),
                        name.location,
                    )
                })?;
                let (slot, ty) = (symbol.slot, symbol.ty);
                self.analysis.slots.insert(expr.id, slot);
                ty
            }
            ExprKind::Field { record, name } => {
                let (ty, index) = self.check_field(record, name)?;
                self.analysis.fields.insert(expr.id, index);
                ty
            }
            ExprKind::Call { name, args } => self.check_call(expr, name, args)?,
        };
        self.analysis.expr_types.insert(expr.id, ty);
        Ok(ty)
    }

    fn check_value(&mut self, expr: &Expr) -> Result<TypeId> {
        let ty = self.check_expr(expr)?;
        if ty == TypeTable::NOTHING {
            return Err(CompileError::new(
                "This expression does not produce a value.",
                expr.location,
            ));
        }
        Ok(ty)
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<TypeId> {
        let ty = self.check_value(operand)?;
        let expected = match op {
            UnaryOp::Not => TypeTable::BOOLEAN,
            UnaryOp::Negate => TypeTable::NUMBER,
        };
        if ty != expected {
            return Err(CompileError::new(
                format!(
                    "Operand of {} operator is not a '{}', but a '{}'.",
                    op.symbol(),
                    self.type_name(expected),
                    self.type_name(ty)
                ),
                operand.location,
            ));
        }
        Ok(expected)
    }

    fn check_binary(
        &mut self,
        expr: &Expr,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<TypeId> {
        let left = self.check_value(lhs)?;
        let right = self.check_value(rhs)?;

        let (operand, result) = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                (TypeTable::NUMBER, TypeTable::NUMBER)
            }
            BinaryOp::Concat => (TypeTable::STRING, TypeTable::STRING),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                (TypeTable::NUMBER, TypeTable::BOOLEAN)
            }
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                (TypeTable::BOOLEAN, TypeTable::BOOLEAN)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if left != right {
                    return Err(CompileError::new(
                        format!(
                            "Can not compare a '{}' to a '{}'.",
                            self.type_name(left),
                            self.type_name(right)
                        ),
                        expr.location,
                    ));
                }
                if let Some(target) = self.find_equals(left) {
                    self.analysis.equals.insert(expr.id, target);
                }
                return Ok(TypeTable::BOOLEAN);
            }
        };

        for (side, ty, operand_expr) in [("Left", left, lhs), ("Right", right, rhs)] {
            if ty != operand {
                return Err(CompileError::new(
                    format!(
                        "{} operand of {} operator is not a '{}', but a '{}'.",
                        side,
                        op.symbol(),
                        self.type_name(operand),
                        self.type_name(ty)
                    ),
                    operand_expr.location,
                ));
            }
        }
        Ok(result)
    }

    fn check_field(&mut self, record: &Expr, name: &Identifier) -> Result<(TypeId, usize)> {
        let base = self.check_value(record)?;
        let Some(record_type) = self.types.record(base) else {
            return Err(CompileError::new(
                format!(
                    "Can not access field '{}' of a value of type '{}'.",
                    name.name,
                    self.type_name(base)
                ),
                record.location,
            ));
        };
        let (index, field) = record_type.field(&name.name).ok_or_else(|| {
            CompileError::new(
                format!(
                    "Record '{}' has no field '{}'.",
                    record_type.name, name.name
                ),
                name.location,
            )
        })?;
        Ok((field.ty, index))
    }

    fn check_call(&mut self, expr: &Expr, name: &Identifier, args: &[Expr]) -> Result<TypeId> {
        let mut arg_names: Vec<String> = Vec::with_capacity(args.len());
        for arg in args {
            let ty = self.check_value(arg)?;
            arg_names.push(self.type_name(ty));
        }
        let key = format!("{}({})", name.name, arg_names.join(","));

        if let Some(&index) = self.function_keys.get(&key) {
            self.analysis.calls.insert(expr.id, CallTarget::Function(index));
            return Ok(self.analysis.functions[index].return_type);
        }

        let arg_refs: Vec<&str> = arg_names.iter().map(String::as_str).collect();
        if let Some((index, external)) = self.externals.lookup(&name.name, &arg_refs) {
            let return_type = self.types.lookup(&external.return_type).ok_or_else(|| {
                CompileError::new(
                    format!(
                        "Could not find type '{}' for return value of external function '{}'.",
                        external.return_type, external.name
                    ),
                    expr.location,
                )
            })?;
            self.analysis.calls.insert(expr.id, CallTarget::External(index));
            return Ok(return_type);
        }

        Err(CompileError::new(
            format!("Can not find function '{}'.", key),
            expr.location,
        ))
    }

    fn find_equals(&self, ty: TypeId) -> Option<CallTarget> {
        let record = self.types.record(ty)?;
        let key = format!("equals({0},{0})", record.name);
        if let Some(&index) = self.function_keys.get(&key) {
            if self.analysis.functions[index].return_type == TypeTable::BOOLEAN {
                return Some(CallTarget::Function(index));
            }
        }
        let params = [record.name.as_str(), record.name.as_str()];
        match self.externals.lookup("equals", &params) {
            Some((index, external)) if external.return_type == "boolean" => {
                Some(CallTarget::External(index))
            }
            _ => None,
        }
    }
}
