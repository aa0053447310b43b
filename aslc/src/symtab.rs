//! Scoped symbol table: a stack of named scopes over an arena that keeps
//! every scope alive for the whole compilation, so the codegen pass can
//! re-enter a function's scope by id and see the identical bindings.

use crate::types::TypeId;
use ast::Ident;
use derive_more::{Deref, DerefMut};

pub const GLOBAL_SCOPE_NAME: &str = "$global";

/// Opaque handle to one scope in the arena.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ScopeId(usize);

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SymbolKind {
    LocalVar,
    Parameter,
    Function,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: Ident,
    pub kind: SymbolKind,
    pub ty: TypeId,
}

/// One scope: its name plus bindings in declaration order.
#[derive(Debug, Deref, DerefMut)]
pub struct Scope {
    pub name: Ident,
    #[deref]
    #[deref_mut]
    symbols: Vec<Symbol>,
}

impl Scope {
    fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            symbols: Vec::new(),
        }
    }

    fn find(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }
}

#[derive(Debug)]
pub struct SymTable {
    scopes: Vec<Scope>,
    stack: Vec<ScopeId>,
}

impl SymTable {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Open a fresh scope called `name`.
    ///
    /// The Global scope is a singleton: pushing its name again re-enters
    /// the one at the bottom. Every other push creates a new scope, so two
    /// functions that collide on a name still keep separate bindings.
    pub fn push_new_scope(&mut self, name: &str) -> ScopeId {
        if name == GLOBAL_SCOPE_NAME {
            if let Some(i) = self.scopes.iter().position(|s| s.name == name) {
                self.stack.push(ScopeId(i));
                return ScopeId(i);
            }
        }
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(name));
        self.stack.push(id);
        id
    }

    /// Re-enter a scope created earlier, by id.
    pub fn push_this_scope(&mut self, id: ScopeId) {
        assert!(id.0 < self.scopes.len(), "unknown scope id {id:?}");
        self.stack.push(id);
    }

    pub fn pop_scope(&mut self) {
        self.stack.pop().expect("scope stack underflow");
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    fn current(&self) -> &Scope {
        let &id = self.stack.last().expect("no open scope");
        self.scope(id)
    }

    fn current_mut(&mut self) -> &mut Scope {
        let &id = self.stack.last().expect("no open scope");
        &mut self.scopes[id.0]
    }

    pub fn find_in_current_scope(&self, name: &str) -> bool {
        self.current().find(name).is_some()
    }

    /// Innermost-first lookup through the open scopes.
    pub fn find_through_stack(&self, name: &str) -> Option<&Symbol> {
        self.stack
            .iter()
            .rev()
            .find_map(|&id| self.scope(id).find(name))
    }

    pub fn add_local(&mut self, name: &str, ty: TypeId) {
        self.add(name, SymbolKind::LocalVar, ty);
    }

    pub fn add_parameter(&mut self, name: &str, ty: TypeId) {
        self.add(name, SymbolKind::Parameter, ty);
    }

    pub fn add_function(&mut self, name: &str, ty: TypeId) {
        self.add(name, SymbolKind::Function, ty);
    }

    // first binding wins; duplicates are dropped (the caller reports them)
    fn add(&mut self, name: &str, kind: SymbolKind, ty: TypeId) {
        if self.find_in_current_scope(name) {
            return;
        }
        self.current_mut().push(Symbol {
            name: name.into(),
            kind,
            ty,
        });
    }

    /// Declared type of a visible symbol. Unknown names are a fault of the
    /// upstream checker.
    pub fn get_type(&self, name: &str) -> TypeId {
        self.find_through_stack(name)
            .unwrap_or_else(|| panic!("no visible declaration for '{name}'"))
            .ty
    }

    pub fn is_local_var(&self, name: &str) -> bool {
        self.find_through_stack(name)
            .is_some_and(|s| s.kind == SymbolKind::LocalVar)
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.find_through_stack(name)
            .is_some_and(|s| s.kind == SymbolKind::Parameter)
    }

    /// Bindings of one scope, in declaration order.
    pub fn bindings(&self, id: ScopeId) -> &[Symbol] {
        self.scope(id)
    }
}

impl Default for SymTable {
    fn default() -> Self {
        Self::new()
    }
}
