//! Parse-tree data model for ASL, as handed over by the external parser.
//!
//! The tree is read-only once built; later passes attach their results to
//! nodes through side tables keyed by [`NodeId`], never by mutating the tree.

pub mod expr;
pub mod stmt;

pub use expr::{BinOp, Call, Expr, ExprKind, LeftExpr, LeftExprKind, UnOp};
pub use stmt::Stmnt;

pub type Ident = String;

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NODE_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Identity of one tree node, unique within the process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NODE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One occurrence of an identifier in the source.
///
/// Each occurrence is its own node: the same name can be decorated
/// differently at different sites (a callee ident carries the function
/// type, a declared ident carries nothing).
#[derive(Debug, Clone)]
pub struct Name {
    pub id: NodeId,
    pub text: Ident,
}

impl Name {
    pub fn new(text: impl Into<Ident>) -> Self {
        Self {
            id: NodeId::new(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    pub id: NodeId,
    pub functions: Vec<Function>,
}

impl Program {
    pub fn new(functions: Vec<Function>) -> Self {
        Self {
            id: NodeId::new(),
            functions,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub id: NodeId,
    pub name: Name,
    pub params: Vec<ParamDecl>,
    /// Declared return type; `None` for procedures.
    pub ret: Option<TypeSpec>,
    pub decls: Vec<VarDecl>,
    pub body: Vec<Stmnt>,
}

impl Function {
    pub fn new(
        name: impl Into<Ident>,
        params: Vec<ParamDecl>,
        ret: Option<TypeSpec>,
        decls: Vec<VarDecl>,
        body: Vec<Stmnt>,
    ) -> Self {
        Self {
            id: NodeId::new(),
            name: Name::new(name),
            params,
            ret,
            decls,
            body,
        }
    }
}

/// One `(ident, type)` pair of a parameter list.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: Name,
    pub ty: TypeSpec,
}

impl ParamDecl {
    pub fn new(name: impl Into<Ident>, ty: TypeSpec) -> Self {
        Self {
            name: Name::new(name),
            ty,
        }
    }
}

/// `var a, b : t;` — several idents sharing one type syntax node.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub names: Vec<Name>,
    pub ty: TypeSpec,
}

impl VarDecl {
    pub fn new<I: Into<Ident>>(names: impl IntoIterator<Item = I>, ty: TypeSpec) -> Self {
        Self {
            names: names.into_iter().map(Name::new).collect(),
            ty,
        }
    }
}

/// A type written in the source: a basic type or `array [N] of basic`.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub id: NodeId,
    pub kind: TypeSpecKind,
}

#[derive(Debug, Clone)]
pub enum TypeSpecKind {
    Basic(BasicType),
    Array {
        len: usize,
        /// Grammar only admits basic element types here.
        elem: Box<TypeSpec>,
    },
}

impl TypeSpec {
    pub fn basic(b: BasicType) -> Self {
        Self {
            id: NodeId::new(),
            kind: TypeSpecKind::Basic(b),
        }
    }

    pub fn array(len: usize, elem: BasicType) -> Self {
        Self {
            id: NodeId::new(),
            kind: TypeSpecKind::Array {
                len,
                elem: Box::new(Self::basic(elem)),
            },
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BasicType {
    Int,
    Float,
    Bool,
    Char,
}
