use crate::{Call, Expr, Ident, LeftExpr};

#[derive(Debug, Clone)]
pub enum Stmnt {
    Assign {
        target: LeftExpr,
        value: Expr,
    },
    If {
        cond: Expr,
        then: Vec<Stmnt>,
        r#else: Option<Vec<Stmnt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmnt>,
    },
    /// A call in statement position; any returned value is discarded.
    Call(Call),
    Read(LeftExpr),
    WriteExpr(Expr),
    /// The string lexeme, quotes included.
    WriteString(Ident),
    Return(Option<Expr>),
}

impl Stmnt {
    pub fn assign(target: LeftExpr, value: Expr) -> Self {
        Self::Assign { target, value }
    }

    pub fn write_string(lexeme: impl Into<Ident>) -> Self {
        Self::WriteString(lexeme.into())
    }
}
