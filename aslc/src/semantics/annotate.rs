//! Second walk: attaches a type to every expression and l-value, the
//! callee's function type to every call ident, and the element type to
//! every indexing node — the decorations the codegen pass reads.
//!
//! The walk assumes a tree the type checker has already accepted; it emits
//! no diagnostics of its own. Contract breaches in the input surface as the
//! types manager's wrong-variant panics.

use crate::decor::TreeDecoration;
use crate::symtab::SymTable;
use crate::types::{TypeId, TypesMgr};
use ast::{BinOp, Call, Expr, ExprKind, Function, LeftExpr, LeftExprKind, Program, Stmnt, UnOp};

pub struct AnnotatePass<'a> {
    types: &'a TypesMgr,
    symbols: &'a mut SymTable,
    decor: &'a mut TreeDecoration,
}

impl<'a> AnnotatePass<'a> {
    pub fn new(
        types: &'a TypesMgr,
        symbols: &'a mut SymTable,
        decor: &'a mut TreeDecoration,
    ) -> Self {
        Self {
            types,
            symbols,
            decor,
        }
    }

    pub fn program(&mut self, prog: &Program) {
        self.symbols.push_this_scope(self.decor.get_scope(prog.id));
        for func in &prog.functions {
            self.function(func);
        }
        self.symbols.pop_scope();
    }

    fn function(&mut self, func: &Function) {
        self.symbols.push_this_scope(self.decor.get_scope(func.id));
        for stmnt in &func.body {
            self.stmnt(stmnt);
        }
        self.symbols.pop_scope();
    }

    fn stmnt(&mut self, stmnt: &Stmnt) {
        match stmnt {
            Stmnt::Assign { target, value } => {
                self.left_expr(target);
                self.expr(value);
            }
            Stmnt::If { cond, then, r#else } => {
                self.expr(cond);
                for s in then {
                    self.stmnt(s);
                }
                for s in r#else.iter().flatten() {
                    self.stmnt(s);
                }
            }
            Stmnt::While { cond, body } => {
                self.expr(cond);
                for s in body {
                    self.stmnt(s);
                }
            }
            Stmnt::Call(call) => {
                self.call(call);
            }
            Stmnt::Read(target) => {
                self.left_expr(target);
            }
            Stmnt::WriteExpr(e) => {
                self.expr(e);
            }
            Stmnt::WriteString(_) => {}
            Stmnt::Return(e) => {
                if let Some(e) = e {
                    self.expr(e);
                }
            }
        }
    }

    fn call(&mut self, call: &Call) -> TypeId {
        let func_ty = self.symbols.get_type(&call.callee.text);
        self.decor.put_type(call.callee.id, func_ty);
        for arg in &call.args {
            self.expr(arg);
        }
        let ret = self.types.func_return_type(func_ty);
        self.decor.put_type(call.id, ret);
        ret
    }

    fn left_expr(&mut self, le: &LeftExpr) -> TypeId {
        let ty = match &le.kind {
            LeftExprKind::Ident(name) => self.symbols.get_type(&name.text),
            LeftExprKind::Index { array, index } => {
                self.expr(index);
                let array_ty = self.symbols.get_type(&array.text);
                self.types.array_elem_type(array_ty)
            }
        };
        self.decor.put_type(le.id, ty);
        ty
    }

    fn expr(&mut self, e: &Expr) -> TypeId {
        let ty = match &e.kind {
            ExprKind::BoolLit(_) => self.types.create_boolean(),
            ExprKind::IntLit(_) => self.types.create_integer(),
            ExprKind::FloatLit(_) => self.types.create_float(),
            ExprKind::CharLit(_) => self.types.create_character(),
            ExprKind::Left(le) => self.left_expr(le),
            ExprKind::Paren(inner) => self.expr(inner),
            ExprKind::Unary { op, operand } => {
                let operand_ty = self.expr(operand);
                match op {
                    UnOp::Not => self.types.create_boolean(),
                    UnOp::Neg | UnOp::Plus => operand_ty,
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.expr(lhs);
                let r = self.expr(rhs);
                if op.relational() || op.logical() {
                    self.types.create_boolean()
                } else if *op == BinOp::Mod {
                    self.types.create_integer()
                } else if self.types.is_float(l) || self.types.is_float(r) {
                    self.types.create_float()
                } else {
                    self.types.create_integer()
                }
            }
            ExprKind::Call(call) => self.call(call),
        };
        self.decor.put_type(e.id, ty);
        ty
    }
}
