//! Collector for semantic diagnostics. Reporting never aborts the
//! compilation; downstream formatting of user messages lives outside the
//! core.

use ast::{Ident, Name, NodeId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemError {
    #[error("identifier '{ident}' already declared in this scope")]
    DeclaredIdent { ident: Ident, node: NodeId },
}

#[derive(Debug, Default)]
pub struct SemErrors(Vec<SemError>);

impl SemErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declared_ident(&mut self, ident: &Name) {
        self.0.push(SemError::DeclaredIdent {
            ident: ident.text.clone(),
            node: ident.id,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SemError> {
        self.0.iter()
    }
}

impl IntoIterator for SemErrors {
    type Item = SemError;
    type IntoIter = std::vec::IntoIter<SemError>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
