//! Instruction set for the Botlang VM
//!
//! The machine is stack based: operands are pushed on a single operand stack
//! shared by all frames, and every instruction pops its inputs and pushes its
//! result. Locals live in per-frame slots addressed by index.
//!
//! Jumps are relative: the target is the jump's own index plus `offset`.

use std::fmt;

use serde::Serialize;

use crate::value::Value;

/// Virtual machine instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", content = "arg", rename_all = "camelCase")]
pub enum Instruction {
    // ===== Stack =====
    /// Push a constant.
    Push(Value),
    /// Discard the top of the stack.
    Pop,
    /// Duplicate the top of the stack.
    Dup,

    // ===== Locals =====
    /// Push the value of slot `n` of the current frame.
    Load(usize),
    /// Pop into slot `n` of the current frame.
    Store(usize),

    // ===== Records =====
    /// Pop a record, push its field `n`.
    LoadField(usize),
    /// Pop a value, then a record, and store the value into field `n`.
    StoreField(usize),

    // ===== Control flow =====
    /// pc = pc + offset
    Jump(isize),
    /// Pop a boolean; if false, pc = pc + offset.
    JumpIfFalse(isize),
    /// Call function `n` of the module. Arguments are on the stack in order.
    Call(usize),
    /// Call external function `n` of the registry.
    CallExternal(usize),
    /// Leave the current frame. A function that returns a value leaves it on
    /// top of the stack.
    Return,

    // ===== Operators =====
    Unary(UnaryOperator),
    Binary(BinaryOperator),
    /// Pop two strings, push their concatenation.
    StringConcat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOperator {
    Not,
    Negate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Xor,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "not",
            UnaryOperator::Negate => "-",
        }
    }
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::And => "and",
            BinaryOperator::Or => "or",
            BinaryOperator::Xor => "xor",
        }
    }
}

impl Instruction {
    /// Mnemonic used by the module dump.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Push(_) => "push",
            Instruction::Pop => "pop",
            Instruction::Dup => "dup",
            Instruction::Load(_) => "load",
            Instruction::Store(_) => "store",
            Instruction::LoadField(_) => "loadField",
            Instruction::StoreField(_) => "storeField",
            Instruction::Jump(_) => "jump",
            Instruction::JumpIfFalse(_) => "jumpIfFalse",
            Instruction::Call(_) => "call",
            Instruction::CallExternal(_) => "callExt",
            Instruction::Return => "return",
            Instruction::Unary(_) => "unaryOp",
            Instruction::Binary(_) => "binaryOp",
            Instruction::StringConcat => "stringConcat",
        }
    }

    /// Whether control can continue to the next instruction.
    pub fn falls_through(&self) -> bool {
        !matches!(self, Instruction::Jump(_) | Instruction::Return)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Instruction::Push(Value::String(s)) => write!(f, "{name:<12} \"{}\"", s.escape_default()),
            Instruction::Push(v) => write!(f, "{name:<12} {v}"),
            Instruction::Load(n)
            | Instruction::Store(n)
            | Instruction::LoadField(n)
            | Instruction::StoreField(n)
            | Instruction::Call(n)
            | Instruction::CallExternal(n) => write!(f, "{name:<12} {n}"),
            Instruction::Jump(off) | Instruction::JumpIfFalse(off) => write!(f, "{name:<12} {off:+}"),
            Instruction::Unary(op) => write!(f, "{name:<12} {}", op.symbol()),
            Instruction::Binary(op) => write!(f, "{name:<12} {}", op.symbol()),
            Instruction::Pop | Instruction::Dup | Instruction::Return | Instruction::StringConcat => {
                write!(f, "{name}")
            }
        }
    }
}
