use std::collections::{BTreeSet, HashMap};

use crate::errors::{DomainError, IdentifierDomain};

/// Dense, deterministic index assignment over a set of external identifiers.
///
/// Indices follow ascending order of the distinct identifiers, so the same
/// set always produces the same mapping no matter how it was supplied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierMap {
    domain: IdentifierDomain,
    forward: HashMap<String, usize>,
    inverse: Vec<String>,
}

impl IdentifierMap {
    pub fn build<I, S>(domain: IdentifierDomain, ids: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let distinct: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if distinct.is_empty() {
            return Err(DomainError::EmptyDomain { domain });
        }

        let inverse: Vec<String> = distinct.into_iter().collect();
        let forward = inverse
            .iter()
            .enumerate()
            .map(|(index, identifier)| (identifier.clone(), index))
            .collect();

        Ok(Self { domain, forward, inverse })
    }

    pub fn domain(&self) -> IdentifierDomain {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    /// Always false for a built map; kept alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.forward.contains_key(identifier)
    }

    pub fn index_of(&self, identifier: &str) -> Result<usize, DomainError> {
        self.forward.get(identifier).copied().ok_or_else(|| DomainError::UnknownIdentifier {
            domain: self.domain,
            identifier: identifier.to_owned(),
        })
    }

    pub fn identifier_at(&self, index: usize) -> Result<&str, DomainError> {
        self.inverse.get(index).map(String::as_str).ok_or(DomainError::IndexOutOfRange {
            domain: self.domain,
            index,
            count: self.inverse.len(),
        })
    }

    /// Identifiers paired with their index, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        self.inverse.iter().enumerate().map(|(index, identifier)| (index, identifier.as_str()))
    }
}
