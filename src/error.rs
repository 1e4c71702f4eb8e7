//! Errors that abort an analysis run

use crate::corpus::TokenId;
use crate::positions::ScopeError;
use crate::relations::{Relation, SetKind};
use thiserror::Error;

/// Structural misuse detected while preparing or running an analysis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("Analysis error: {0}")]
    Scope(#[from] ScopeError),

    #[error("Analysis error: {relation} rules reference the {set} set, which was never populated")]
    UndefinedSet { relation: Relation, set: SetKind },

    #[error("Analysis error: token {token} has no book, so no accent partition applies")]
    Unsectioned { token: TokenId },
}
