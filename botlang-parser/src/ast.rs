/// Owned AST types for the Botlang language.
///
/// Every expression, function, parameter and variable declaration carries a
/// `NodeId` that is unique within one parsed program. Later passes record
/// what they learn about a node (its type, the function a call resolves to,
/// the slot a variable lives in) in side tables keyed by that id, so the tree
/// itself is never mutated after parsing.
use diagnostics::SourceLocation;

/// Stable per-program node index.
pub type NodeId = u32;

/// A complete program: top-level statements in source order, including
/// function and record declarations.
#[derive(Clone, Debug)]
pub struct Program {
    pub statements: Vec<Stmt>,
    /// Number of ids handed out while parsing; every `NodeId` is below it.
    pub node_count: u32,
}

/// A name together with where it was written.
#[derive(Clone, Debug, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub location: SourceLocation,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Clone, Debug)]
pub enum Stmt {
    Comment {
        text: String,
        location: SourceLocation,
    },
    Function(FunctionDecl),
    Record(RecordDecl),
    Variable(VariableDecl),
    Assignment {
        target: Expr,
        value: Expr,
        location: SourceLocation,
    },
    Repeat {
        count: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        location: SourceLocation,
    },
    If {
        condition: Expr,
        then_block: Vec<Stmt>,
        else_ifs: Vec<ElseIf>,
        else_block: Vec<Stmt>,
        location: SourceLocation,
    },
    Return {
        value: Option<Expr>,
        location: SourceLocation,
    },
    Break {
        location: SourceLocation,
    },
    Continue {
        location: SourceLocation,
    },
    Expr(Expr),
}

impl Stmt {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Stmt::Comment { location, .. }
            | Stmt::Assignment { location, .. }
            | Stmt::Repeat { location, .. }
            | Stmt::While { location, .. }
            | Stmt::If { location, .. }
            | Stmt::Return { location, .. }
            | Stmt::Break { location }
            | Stmt::Continue { location } => location,
            Stmt::Function(decl) => &decl.location,
            Stmt::Record(decl) => &decl.location,
            Stmt::Variable(decl) => &decl.location,
            Stmt::Expr(expr) => &expr.location,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ElseIf {
    pub condition: Expr,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// `fun name(p: type, ...): type ... end`
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: Identifier,
    pub params: Vec<Parameter>,
    /// `None` means the function returns `nothing`.
    pub return_type: Option<Identifier>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub id: NodeId,
    pub name: Identifier,
    pub type_name: Identifier,
}

/// `record Name field: type ... end`
#[derive(Clone, Debug)]
pub struct RecordDecl {
    pub name: Identifier,
    pub fields: Vec<FieldDecl>,
    pub location: SourceLocation,
}

#[derive(Clone, Debug)]
pub struct FieldDecl {
    pub name: Identifier,
    pub type_name: Identifier,
}

/// `var name (: type)? = value`
#[derive(Clone, Debug)]
pub struct VariableDecl {
    pub id: NodeId,
    pub name: Identifier,
    pub type_name: Option<Identifier>,
    pub value: Expr,
    pub location: SourceLocation,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Clone, Debug)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub location: SourceLocation,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Number(f64),
    Boolean(bool),
    String(String),
    List(Vec<Expr>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Variable(Identifier),
    Field {
        record: Box<Expr>,
        name: Identifier,
    },
    Index {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        name: Identifier,
        args: Vec<Expr>,
    },
}

impl ExprKind {
    /// Whether this expression may appear on the left of `=`.
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            ExprKind::Variable(_) | ExprKind::Field { .. } | ExprKind::Index { .. }
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Negate,
}

impl UnaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::Negate => "-",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Concat,
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

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Concat => "..",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
        }
    }
}
