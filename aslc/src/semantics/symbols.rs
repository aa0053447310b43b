//! First walk: registers every declaration, builds function types, and
//! decorates the tree with scope and type handles.
//!
//! Duplicate declarations are reported and dropped; the walk always runs to
//! completion so one compilation can surface every declaration error.

use crate::decor::TreeDecoration;
use crate::errors::SemErrors;
use crate::symtab::{SymTable, GLOBAL_SCOPE_NAME};
use crate::types::{TypeId, TypesMgr};
use ast::{BasicType, Function, ParamDecl, Program, TypeSpec, TypeSpecKind, VarDecl};

pub struct SymbolsPass<'a> {
    types: &'a mut TypesMgr,
    symbols: &'a mut SymTable,
    decor: &'a mut TreeDecoration,
    errors: &'a mut SemErrors,
}

impl<'a> SymbolsPass<'a> {
    pub fn new(
        types: &'a mut TypesMgr,
        symbols: &'a mut SymTable,
        decor: &'a mut TreeDecoration,
        errors: &'a mut SemErrors,
    ) -> Self {
        Self {
            types,
            symbols,
            decor,
            errors,
        }
    }

    pub fn program(&mut self, prog: &Program) {
        let sc = self.symbols.push_new_scope(GLOBAL_SCOPE_NAME);
        self.decor.put_scope(prog.id, sc);
        for func in &prog.functions {
            self.function(func);
        }
        self.symbols.pop_scope();
    }

    fn function(&mut self, func: &Function) {
        let redefined = self.symbols.find_in_current_scope(&func.name.text);
        if redefined {
            self.errors.declared_ident(&func.name);
        }

        // on a repeated walk the node already knows its scope; re-enter it
        // instead of minting a second one under the same name
        let sc = if self.decor.has_scope(func.id) {
            let sc = self.decor.get_scope(func.id);
            self.symbols.push_this_scope(sc);
            sc
        } else {
            self.symbols.push_new_scope(&func.name.text)
        };
        self.decor.put_scope(func.id, sc);
        self.parameter_decl(&func.params);
        for dec in &func.decls {
            self.variable_decl(dec);
        }
        self.symbols.pop_scope();

        let ret = match &func.ret {
            Some(ts) => self.type_spec(ts),
            None => self.types.create_void(),
        };
        let params = func
            .params
            .iter()
            .map(|p| self.decor.get_type(p.ty.id))
            .collect();
        let func_ty = self.types.create_function(params, ret);
        self.decor.put_type(func.id, func_ty);
        if !redefined {
            self.symbols.add_function(&func.name.text, func_ty);
        }
    }

    fn parameter_decl(&mut self, params: &[ParamDecl]) {
        for param in params {
            let ty = self.type_spec(&param.ty);
            if self.symbols.find_in_current_scope(&param.name.text) {
                self.errors.declared_ident(&param.name);
            } else {
                self.symbols.add_parameter(&param.name.text, ty);
            }
        }
    }

    fn variable_decl(&mut self, dec: &VarDecl) {
        let ty = self.type_spec(&dec.ty);
        for name in &dec.names {
            if self.symbols.find_in_current_scope(&name.text) {
                self.errors.declared_ident(name);
            } else {
                self.symbols.add_local(&name.text, ty);
            }
        }
    }

    fn type_spec(&mut self, ts: &TypeSpec) -> TypeId {
        let ty = match &ts.kind {
            TypeSpecKind::Basic(basic) => self.basic_type(*basic),
            TypeSpecKind::Array { len, elem } => {
                let elem_ty = self.type_spec(elem);
                self.types.create_array(*len, elem_ty)
            }
        };
        self.decor.put_type(ts.id, ty);
        ty
    }

    fn basic_type(&mut self, basic: BasicType) -> TypeId {
        match basic {
            BasicType::Int => self.types.create_integer(),
            BasicType::Float => self.types.create_float(),
            BasicType::Bool => self.types.create_boolean(),
            BasicType::Char => self.types.create_character(),
        }
    }
}
