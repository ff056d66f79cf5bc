use botlang_parser::ast::{Expr, ExprKind, Stmt, VariableDecl};
use diagnostics::SourceLocation;

use crate::error::{CompileError, Result};
use crate::types::{TypeId, TypeTable};

use super::expressions::ExpressionChecker;
use super::Checker;

pub trait StatementChecker {
    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()>;
    fn check_block(&mut self, stmts: &[Stmt]) -> Result<()>;
    fn check_variable(&mut self, decl: &VariableDecl) -> Result<()>;
    fn check_assignment(&mut self, target: &Expr, value: &Expr, location: SourceLocation)
        -> Result<()>;
    fn check_condition(&mut self, condition: &Expr, statement: &str, expected: TypeId)
        -> Result<()>;
    fn check_return(&mut self, value: Option<&Expr>, location: SourceLocation) -> Result<()>;
    fn check_loop_body(&mut self, body: &[Stmt]) -> Result<()>;
}

impl StatementChecker for Checker<'_> {
    fn check_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Comment { .. } => Ok(()),
            Stmt::Function(decl) => Err(CompileError::new(
                "Functions can only be declared at the top level.",
                decl.name.location,
            )),
            Stmt::Record(decl) => Err(CompileError::new(
                "Records can only be declared at the top level.",
                decl.name.location,
            )),
            Stmt::Variable(decl) => self.check_variable(decl),
            Stmt::Assignment {
                target,
                value,
                location,
            } => self.check_assignment(target, value, *location),
            Stmt::Repeat { count, body, .. } => {
                self.check_condition(count, "repeat", TypeTable::NUMBER)?;
                self.check_loop_body(body)
            }
            Stmt::While {
                condition, body, ..
            } => {
                self.check_condition(condition, "while", TypeTable::BOOLEAN)?;
                self.check_loop_body(body)
            }
            Stmt::If {
                condition,
                then_block,
                else_ifs,
                else_block,
                ..
            } => {
                self.check_condition(condition, "if", TypeTable::BOOLEAN)?;
                self.check_block(then_block)?;
                for branch in else_ifs {
                    self.check_condition(&branch.condition, "if", TypeTable::BOOLEAN)?;
                    self.check_block(&branch.body)?;
                }
                self.check_block(else_block)
            }
            Stmt::Return { value, location } => self.check_return(value.as_ref(), *location),
            Stmt::Break { location } | Stmt::Continue { location } => {
                if self.loop_depth == 0 {
                    let keyword = if matches!(stmt, Stmt::Break { .. }) {
                        "break"
                    } else {
                        "continue"
                    };
                    return Err(CompileError::new(
                        format!(
                            "'{}' can only be used inside a 'while' or 'repeat' loop.",
                            keyword
                        ),
                        *location,
                    ));
                }
                Ok(())
            }
            Stmt::Expr(expr) => self.check_expr(expr).map(|_| ()),
        }
    }

    fn check_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.scopes.begin_scope();
        for stmt in stmts {
            self.check_stmt(stmt)?;
        }
        self.scopes.end_scope();
        Ok(())
    }

    fn check_loop_body(&mut self, body: &[Stmt]) -> Result<()> {
        self.loop_depth += 1;
        let result = self.check_block(body);
        self.loop_depth -= 1;
        result
    }

    fn check_variable(&mut self, decl: &VariableDecl) -> Result<()> {
        let value_type = self.check_value(&decl.value)?;

        if let Some(type_name) = &decl.type_name {
            let declared = self.types.lookup(&type_name.name).ok_or_else(|| {
                CompileError::new(
                    format!(
                        "Unknown type '{}' for variable '{}'.",
                        type_name.name, decl.name.name
                    ),
                    type_name.location,
                )
            })?;
            if declared != value_type {
                return Err(CompileError::new(
                    format!(
                        "Can not assign a value of type '{}' to variable '{}' with type '{}'.",
                        self.type_name(value_type),
                        decl.name.name,
                        self.type_name(declared)
                    ),
                    decl.value.location,
                ));
            }
        }

        let slot = self
            .scopes
            .declare(&decl.name.name, value_type, decl.name.location)
            .map_err(|other| {
                CompileError::new(
                    format!(
                        "Variable {} already defined in line {}, column {}.",
                        decl.name.name, other.location.start.line, other.location.start.column
                    ),
                    decl.name.location,
                )
            })?;
        self.analysis.slots.insert(decl.id, slot);
        Ok(())
    }

    fn check_assignment(
        &mut self,
        target: &Expr,
        value: &Expr,
        location: SourceLocation,
    ) -> Result<()> {
        let value_type = self.check_value(value)?;

        let (target_type, what) = match &target.kind {
            ExprKind::Variable(name) => {
                let symbol = self.scopes.resolve(&name.name).cloned().ok_or_else(|| {
                    CompileError::new(
                        format!(
                            "Can not find variable or parameter with name '{}'.",
                            name.name
                        ),
                        name.location,
                    )
                })?;
                self.analysis.slots.insert(target.id, symbol.slot);
                self.analysis.expr_types.insert(target.id, symbol.ty);
                (symbol.ty, "variable")
            }
            ExprKind::Field { .. } => (self.check_expr(target)?, "field"),
            ExprKind::Index { .. } => {
                return Err(CompileError::new(
                    "Array element assignment is not implemented yet.",
                    target.location,
                ))
            }
            _ => {
                return Err(CompileError::new(
                    "Only variables and fields can be assigned to.",
                    target.location,
                ))
            }
        };

        if target_type != value_type {
            return Err(CompileError::new(
                format!(
                    "Can not assign a value of type '{}' to a {} of type '{}'.",
                    self.type_name(value_type),
                    what,
                    self.type_name(target_type)
                ),
                location,
            ));
        }
        Ok(())
    }

    fn check_condition(&mut self, condition: &Expr, statement: &str, expected: TypeId) -> Result<()> {
        let ty = self.check_expr(condition)?;
        if ty != expected {
            let label = if statement == "repeat" { "Count" } else { "Condition" };
            return Err(CompileError::new(
                format!(
                    "{} of {} statement must be a '{}', but is a '{}'.",
                    label,
                    statement,
                    self.type_name(expected),
                    self.type_name(ty)
                ),
                condition.location,
            ));
        }
        Ok(())
    }

    fn check_return(&mut self, value: Option<&Expr>, location: SourceLocation) -> Result<()> {
        let value_type = match value {
            Some(expr) => Some(self.check_value(expr)?),
            None => None,
        };

        if self.current == 0 {
            if value_type.is_some() {
                return Err(CompileError::new(
                    "Can not return a value from the main program.",
                    location,
                ));
            }
            return Ok(());
        }

        let function = self.current_function();
        let expected = function.return_type;
        let message = match value_type {
            None if expected != TypeTable::NOTHING => format!(
                "Function '{}' must return a value of type '{}'.",
                function.signature,
                self.type_name(expected)
            ),
            Some(_) if expected == TypeTable::NOTHING => {
                format!("Function '{}' must not return a value.", function.signature)
            }
            Some(actual) if actual != expected => format!(
                "Function '{}' must return a value of type '{}', but a value of type '{}' is returned.",
                function.signature,
                self.type_name(expected),
                self.type_name(actual)
            ),
            _ => return Ok(()),
        };
        Err(CompileError::new(message, location))
    }
}
