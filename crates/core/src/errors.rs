use std::fmt;

use thiserror::Error;

/// Which identifier universe a map or lookup belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IdentifierDomain {
    User,
    Item,
}

impl IdentifierDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Item => "item",
        }
    }
}

impl fmt::Display for IdentifierDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("cannot build a {domain} map from an empty identifier set")]
    EmptyDomain { domain: IdentifierDomain },
    #[error("rating record references unmapped {domain} identifier `{identifier}`")]
    UnmappedIdentifier { domain: IdentifierDomain, identifier: String },
    #[error("rating for user `{user_id}` and item `{item_id}` is not a finite number: {rating}")]
    InvalidRating { user_id: String, item_id: String, rating: f64 },
    #[error("unknown {domain} identifier `{identifier}`")]
    UnknownIdentifier { domain: IdentifierDomain, identifier: String },
    #[error("{domain} index {index} is out of range 0..{count}")]
    IndexOutOfRange { domain: IdentifierDomain, index: usize, count: usize },
    #[error("no ratings are known for item `{0}`")]
    UnknownItem(String),
    #[error("requested {requested} neighbors but only {available} other items exist")]
    InsufficientCandidates { requested: usize, available: usize },
    #[error("neighbor count must be at least 1, got {0}")]
    InvalidNeighborCount(usize),
    #[error("invalid distance metric: {0}")]
    InvalidMetric(String),
}

impl DomainError {
    /// Errors a batch caller may record against a single seed and move past.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownItem(_) | Self::InsufficientCandidates { .. })
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("configuration failure: {0}")]
    Configuration(String),
}
