use botlang_parser::ast::{ElseIf, Expr, Stmt};
use diagnostics::SourceLocation;
use vm::{BinaryOperator, Instruction, Value};

use crate::error::{CompileError, Result};

use super::expressions::ExpressionEmitter;
use super::statements::StatementEmitter;
use super::{Emitter, LoopContext, LoopKind};

pub trait ControlFlowEmitter {
    fn emit_block(&mut self, stmts: &[Stmt]) -> Result<()>;
    fn emit_if(
        &mut self,
        condition: &Expr,
        then_block: &[Stmt],
        else_ifs: &[ElseIf],
        else_block: &[Stmt],
    ) -> Result<()>;
    fn emit_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<()>;
    fn emit_repeat(&mut self, count: &Expr, body: &[Stmt]) -> Result<()>;

    // Low level
    fn emit_condition(&mut self, condition: &Expr) -> Result<usize>;
    fn emit_jump(&mut self, conditional: bool, location: SourceLocation) -> usize;
    fn patch_jump(&mut self, index: usize);
    fn emit_loop(&mut self, target: usize, location: SourceLocation);
    fn enter_loop(&mut self, kind: LoopKind, continue_target: Option<usize>);
    fn exit_loop(&mut self, break_target: usize) -> Result<()>;

    // Statements
    fn emit_break(&mut self, location: SourceLocation) -> Result<()>;
    fn emit_continue(&mut self, location: SourceLocation) -> Result<()>;
}

impl ControlFlowEmitter for Emitter<'_> {
    /// A branch or loop condition and the jump taken when it is false, all
    /// on the condition's first line.
    fn emit_condition(&mut self, condition: &Expr) -> Result<usize> {
        self.anchored(condition.location, |this| {
            this.emit_expr(condition)?;
            Ok(this.emit_jump(true, condition.location))
        })
    }

    fn emit_jump(&mut self, conditional: bool, location: SourceLocation) -> usize {
        let placeholder = if conditional {
            Instruction::JumpIfFalse(0)
        } else {
            Instruction::Jump(0)
        };
        self.function.emit(placeholder, location)
    }

    /// Point the jump at `index` to the next instruction to be emitted.
    fn patch_jump(&mut self, index: usize) {
        let offset = self.function.len() as isize - index as isize;
        match &mut self.function.instructions[index] {
            Instruction::Jump(o) | Instruction::JumpIfFalse(o) => *o = offset,
            _ => {}
        }
    }

    fn emit_loop(&mut self, target: usize, location: SourceLocation) {
        let offset = target as isize - self.function.len() as isize;
        self.function.emit(Instruction::Jump(offset), location);
    }

    fn enter_loop(&mut self, kind: LoopKind, continue_target: Option<usize>) {
        self.function.loop_stack.push(LoopContext {
            kind,
            continue_target,
            continue_jumps: Vec::new(),
            break_jumps: Vec::new(),
        });
    }

    fn exit_loop(&mut self, break_target: usize) -> Result<()> {
        let context = self
            .function
            .loop_stack
            .pop()
            .ok_or_else(|| CompileError::at_start("Loop stack underflow."))?;
        for jump in context.break_jumps {
            let offset = break_target as isize - jump as isize;
            if let Instruction::Jump(o) = &mut self.function.instructions[jump] {
                *o = offset;
            }
        }
        Ok(())
    }

    fn emit_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.open_block();
        for stmt in stmts {
            self.emit_stmt(stmt)?;
        }
        self.close_block();
        Ok(())
    }

    fn emit_if(
        &mut self,
        condition: &Expr,
        then_block: &[Stmt],
        else_ifs: &[ElseIf],
        else_block: &[Stmt],
    ) -> Result<()> {
        let mut end_jumps = Vec::with_capacity(else_ifs.len() + 1);

        let branches = std::iter::once((condition, then_block))
            .chain(else_ifs.iter().map(|b| (&b.condition, b.body.as_slice())));
        for (condition, block) in branches {
            let skip = self.emit_condition(condition)?;
            self.emit_block(block)?;
            // Stays on the block's last line so stepping does not revisit
            // the condition.
            let end = self
                .function
                .emit_continuing(Instruction::Jump(0), condition.location);
            end_jumps.push(end);
            self.patch_jump(skip);
        }

        self.emit_block(else_block)?;
        for jump in end_jumps {
            self.patch_jump(jump);
        }
        Ok(())
    }

    fn emit_while(&mut self, condition: &Expr, body: &[Stmt]) -> Result<()> {
        let head = self.function.len();
        let exit = self.emit_condition(condition)?;

        self.enter_loop(LoopKind::While, Some(head));
        self.emit_block(body)?;
        self.emit_loop(head, condition.location);

        self.patch_jump(exit);
        let end = self.function.len();
        self.exit_loop(end)
    }

    /// The count stays on the operand stack for the whole loop:
    ///
    /// ```text
    /// head:  dup; push 0; > ; jumpIfFalse end
    ///        body
    /// next:  push 1; - ; jump head
    /// end:   pop
    /// ```
    ///
    /// `break` pops the count itself and jumps past the final `pop`.
    fn emit_repeat(&mut self, count: &Expr, body: &[Stmt]) -> Result<()> {
        let location = count.location;
        self.anchored(location, |this| this.emit_expr(count))?;

        let head = self.function.emit(Instruction::Dup, location);
        self.function.emit(Instruction::Push(Value::Number(0.0)), location);
        self.function
            .emit(Instruction::Binary(BinaryOperator::Gt), location);
        let exit = self.emit_jump(true, location);

        self.enter_loop(LoopKind::Repeat, None);
        self.emit_block(body)?;

        let next = self.function.len();
        if let Some(context) = self.function.loop_stack.last_mut() {
            context.continue_target = Some(next);
            let jumps = std::mem::take(&mut context.continue_jumps);
            for jump in jumps {
                if let Instruction::Jump(o) = &mut self.function.instructions[jump] {
                    *o = next as isize - jump as isize;
                }
            }
        }
        self.function.emit(Instruction::Push(Value::Number(1.0)), location);
        self.function
            .emit(Instruction::Binary(BinaryOperator::Sub), location);
        self.emit_loop(head, location);

        self.patch_jump(exit);
        self.function.emit(Instruction::Pop, location);
        let end = self.function.len();
        self.exit_loop(end)
    }

    fn emit_break(&mut self, location: SourceLocation) -> Result<()> {
        let kind = self
            .function
            .loop_stack
            .last()
            .map(|context| context.kind)
            .ok_or_else(|| {
                CompileError::new(
                    "'break' can only be used inside a 'while' or 'repeat' loop.",
                    location,
                )
            })?;
        if kind == LoopKind::Repeat {
            self.function.emit(Instruction::Pop, location);
        }
        let jump = self.emit_jump(false, location);
        if let Some(context) = self.function.loop_stack.last_mut() {
            context.break_jumps.push(jump);
        }
        Ok(())
    }

    fn emit_continue(&mut self, location: SourceLocation) -> Result<()> {
        let target = self
            .function
            .loop_stack
            .last()
            .map(|context| context.continue_target)
            .ok_or_else(|| {
                CompileError::new(
                    "'continue' can only be used inside a 'while' or 'repeat' loop.",
                    location,
                )
            })?;
        match target {
            Some(target) => self.emit_loop(target, location),
            None => {
                let jump = self.emit_jump(false, location);
                if let Some(context) = self.function.loop_stack.last_mut() {
                    context.continue_jumps.push(jump);
                }
            }
        }
        Ok(())
    }
}
