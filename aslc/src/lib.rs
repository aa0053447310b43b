//! Semantic analysis and code generation for ASL.
//!
//! The input is a parse tree built by the external parser (`ast` crate).
//! Compilation is two tree walks plus the type-annotation walk in between:
//! the symbols pass fills the scoped symbol table and decorates the tree,
//! the annotation pass types every expression, and the codegen pass lowers
//! each function to a subroutine of the abstract machine (`asm` crate).
//!
//! Declaration errors are collected, never fatal: the first binding wins
//! and the program is still emitted so one run can report everything.
//! Missing decorations or wrong-variant type queries, on the other hand,
//! mean an upstream pass broke its contract, and panic.

pub mod codegen;
pub mod decor;
pub mod errors;
pub mod semantics;
pub mod symtab;
pub mod types;

pub use codegen::{CodeAttribs, CodeGen};
pub use decor::TreeDecoration;
pub use errors::{SemError, SemErrors};
pub use semantics::{AnnotatePass, SymbolsPass};
pub use symtab::{ScopeId, SymTable, Symbol, SymbolKind, GLOBAL_SCOPE_NAME};
pub use types::{TypeId, TypesMgr};

/// How far to drive one compilation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Stage {
    /// Stop after the symbols pass.
    Symbols,
    /// Stop after type annotation.
    Annotate,
    /// Run to emitted code.
    Codegen,
}

/// Everything one compilation produced.
#[derive(Debug)]
pub struct Compilation {
    /// The emitted program; present when the requested stage reached
    /// codegen.
    pub program: Option<asm::Program>,
    pub errors: SemErrors,
}

pub fn compile(tree: &ast::Program, stage: Stage) -> Compilation {
    let mut types = TypesMgr::new();
    let mut symbols = SymTable::new();
    let mut decor = TreeDecoration::new();
    let mut errors = SemErrors::new();

    SymbolsPass::new(&mut types, &mut symbols, &mut decor, &mut errors).program(tree);
    if stage == Stage::Symbols {
        return Compilation {
            program: None,
            errors,
        };
    }

    AnnotatePass::new(&types, &mut symbols, &mut decor).program(tree);
    if stage == Stage::Annotate {
        return Compilation {
            program: None,
            errors,
        };
    }

    let program = CodeGen::new(&types, &mut symbols, &decor).program(tree);
    Compilation {
        program: Some(program),
        errors,
    }
}
