//! Graph runtime error taxonomy.

use thiserror::Error;

/// Errors raised constructing or rebinding a [`Brain`](crate::runtime::Brain).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("weight slab too short: have {have}, need {need}")]
    SizeMismatch { have: usize, need: usize },
}
