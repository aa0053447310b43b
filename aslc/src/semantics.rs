//! The two tree walks that run before code generation: symbol/scope
//! registration and type annotation.

pub mod annotate;
pub mod symbols;

pub use annotate::AnnotatePass;
pub use symbols::SymbolsPass;
