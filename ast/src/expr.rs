use crate::{Ident, Name, NodeId};

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    BoolLit(bool),
    /// Lexemes are kept verbatim; the emitted program carries them through.
    IntLit(Ident),
    FloatLit(Ident),
    /// Full lexeme, outer delimiters included (`'a'`, `'\n'`).
    CharLit(Ident),
    /// An l-value read as a value.
    Left(Box<LeftExpr>),
    Paren(Box<Expr>),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call(Call),
}

impl Expr {
    fn new(kind: ExprKind) -> Self {
        Self {
            id: NodeId::new(),
            kind,
        }
    }

    pub fn boolean(b: bool) -> Self {
        Self::new(ExprKind::BoolLit(b))
    }

    pub fn int(lexeme: impl Into<Ident>) -> Self {
        Self::new(ExprKind::IntLit(lexeme.into()))
    }

    pub fn float(lexeme: impl Into<Ident>) -> Self {
        Self::new(ExprKind::FloatLit(lexeme.into()))
    }

    pub fn character(lexeme: impl Into<Ident>) -> Self {
        Self::new(ExprKind::CharLit(lexeme.into()))
    }

    pub fn ident(name: impl Into<Ident>) -> Self {
        Self::new(ExprKind::Left(Box::new(LeftExpr::ident(name))))
    }

    pub fn index(array: impl Into<Ident>, index: Expr) -> Self {
        Self::new(ExprKind::Left(Box::new(LeftExpr::index(array, index))))
    }

    pub fn paren(inner: Expr) -> Self {
        Self::new(ExprKind::Paren(Box::new(inner)))
    }

    pub fn unary(op: UnOp, operand: Expr) -> Self {
        Self::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    pub fn call(callee: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Self::new(ExprKind::Call(Call::new(callee, args)))
    }
}

/// The target side of assignments and reads: `x` or `a[e]`.
#[derive(Debug, Clone)]
pub struct LeftExpr {
    pub id: NodeId,
    pub kind: LeftExprKind,
}

#[derive(Debug, Clone)]
pub enum LeftExprKind {
    Ident(Name),
    Index { array: Name, index: Expr },
}

impl LeftExpr {
    pub fn ident(name: impl Into<Ident>) -> Self {
        Self {
            id: NodeId::new(),
            kind: LeftExprKind::Ident(Name::new(name)),
        }
    }

    pub fn index(array: impl Into<Ident>, index: Expr) -> Self {
        Self {
            id: NodeId::new(),
            kind: LeftExprKind::Index {
                array: Name::new(array),
                index,
            },
        }
    }
}

/// A call site, shared between call expressions and call statements.
#[derive(Debug, Clone)]
pub struct Call {
    pub id: NodeId,
    pub callee: Name,
    pub args: Vec<Expr>,
}

impl Call {
    pub fn new(callee: impl Into<Ident>, args: Vec<Expr>) -> Self {
        Self {
            id: NodeId::new(),
            callee: Name::new(callee),
            args,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinOp {
    pub const fn arithmetic(&self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod)
    }

    pub const fn relational(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Neq | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    pub const fn logical(&self) -> bool {
        matches!(self, Self::And | Self::Or)
    }
}
