use botlang_parser::ast::{Expr, ExprKind, Stmt};
use diagnostics::SourceLocation;
use vm::Instruction;

use crate::error::{CompileError, Result};
use crate::types::TypeTable;

use super::control_flow::ControlFlowEmitter;
use super::expressions::ExpressionEmitter;
use super::Emitter;

pub trait StatementEmitter {
    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<()>;
    fn emit_simple_stmt(&mut self, stmt: &Stmt) -> Result<()>;
    fn emit_assignment(&mut self, target: &Expr, value: &Expr, location: SourceLocation)
        -> Result<()>;
}

impl StatementEmitter for Emitter<'_> {
    /// Simple statements own a single line: everything they emit, however
    /// many lines their expressions span, is attributed to where they start.
    fn emit_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            // Declarations are emitted as functions of their own.
            Stmt::Comment { .. } | Stmt::Function(_) | Stmt::Record(_) => Ok(()),
            Stmt::Repeat { count, body, .. } => self.emit_repeat(count, body),
            Stmt::While {
                condition, body, ..
            } => self.emit_while(condition, body),
            Stmt::If {
                condition,
                then_block,
                else_ifs,
                else_block,
                ..
            } => self.emit_if(condition, then_block, else_ifs, else_block),
            Stmt::Variable(_)
            | Stmt::Assignment { .. }
            | Stmt::Return { .. }
            | Stmt::Break { .. }
            | Stmt::Continue { .. }
            | Stmt::Expr(_) => self.anchored(*stmt.location(), |this| this.emit_simple_stmt(stmt)),
        }
    }

    fn emit_simple_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Variable(decl) => {
                self.emit_expr(&decl.value)?;
                let slot = self.slot_of(decl.id, decl.name.location)?;
                self.function.emit(Instruction::Store(slot), decl.location);
                self.declare_slot(slot);
                Ok(())
            }
            Stmt::Assignment {
                target,
                value,
                location,
            } => self.emit_assignment(target, value, *location),
            Stmt::Return { value, location } => {
                if let Some(value) = value {
                    self.emit_expr(value)?;
                }
                self.function.emit(Instruction::Return, *location);
                Ok(())
            }
            Stmt::Break { location } => self.emit_break(*location),
            Stmt::Continue { location } => self.emit_continue(*location),
            Stmt::Expr(expr) => {
                self.emit_expr(expr)?;
                // Nobody consumes the value.
                if self.analysis.type_of(expr.id) != TypeTable::NOTHING {
                    self.function.emit(Instruction::Pop, expr.location);
                }
                Ok(())
            }
            _ => self.emit_stmt(stmt),
        }
    }

    fn emit_assignment(
        &mut self,
        target: &Expr,
        value: &Expr,
        location: SourceLocation,
    ) -> Result<()> {
        match &target.kind {
            ExprKind::Variable(_) => {
                self.emit_expr(value)?;
                let slot = self.slot_of(target.id, target.location)?;
                self.function.emit(Instruction::Store(slot), location);
                Ok(())
            }
            ExprKind::Field { record, .. } => {
                let field = self
                    .analysis
                    .fields
                    .get(&target.id)
                    .copied()
                    .ok_or_else(|| CompileError::new("Unresolved field.", target.location))?;
                self.emit_expr(record)?;
                self.emit_expr(value)?;
                self.function.emit(Instruction::StoreField(field), location);
                Ok(())
            }
            _ => Err(CompileError::new(
                "Array element assignment is not implemented yet.",
                target.location,
            )),
        }
    }
}
