use crate::errors::{DomainError, IdentifierDomain};
use crate::mapping::IdentifierMap;
use crate::matrix::{SparseInteractionMatrix, SparseMatrixBuilder};
use crate::ratings::{retain_rated, RatingRecord};

/// One immutable snapshot of the rating data: both maps plus the matrix.
#[derive(Clone, Debug)]
pub struct InteractionModel {
    users: IdentifierMap,
    items: IdentifierMap,
    matrix: SparseInteractionMatrix,
}

impl InteractionModel {
    /// Filters unrated records, maps the remaining ids and builds the matrix.
    pub fn from_records<I>(records: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = RatingRecord>,
    {
        let records = retain_rated(records);
        let users = IdentifierMap::build(
            IdentifierDomain::User,
            records.iter().map(|record| record.user_id.as_str()),
        )?;
        let items = IdentifierMap::build(
            IdentifierDomain::Item,
            records.iter().map(|record| record.item_id.as_str()),
        )?;

        Self::from_parts(users, items, &records)
    }

    /// Uses maps built by the caller, e.g. over a wider identifier universe
    /// than the records cover.
    pub fn from_parts(
        users: IdentifierMap,
        items: IdentifierMap,
        records: &[RatingRecord],
    ) -> Result<Self, DomainError> {
        let matrix = SparseMatrixBuilder::build(records, &users, &items)?;
        Ok(Self { users, items, matrix })
    }

    pub fn users(&self) -> &IdentifierMap {
        &self.users
    }

    pub fn items(&self) -> &IdentifierMap {
        &self.items
    }

    pub fn matrix(&self) -> &SparseInteractionMatrix {
        &self.matrix
    }
}
