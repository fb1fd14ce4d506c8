use sprs::{CsMat, TriMat};
use tracing::info;

use crate::errors::{DomainError, IdentifierDomain};
use crate::mapping::IdentifierMap;
use crate::ratings::RatingRecord;

/// Borrowed sparse vector: stored coordinates in ascending index order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemVector<'a> {
    indices: &'a [usize],
    values: &'a [f64],
}

impl<'a> ItemVector<'a> {
    /// `indices` must be strictly ascending and as long as `values`.
    pub(crate) fn new(indices: &'a [usize], values: &'a [f64]) -> Self {
        debug_assert_eq!(indices.len(), values.len());
        Self { indices, values }
    }

    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|value| value * value).sum::<f64>().sqrt()
    }
}

/// Immutable M x N rating matrix (M users, N items); absent cells are 0.
///
/// Holds the same cells twice: user-major for cell lookup and item-major so
/// that an item's vector over all users is a contiguous slice.
#[derive(Clone, Debug)]
pub struct SparseInteractionMatrix {
    by_user: CsMat<f64>,
    by_item: ItemMajor,
}

/// Compressed-column storage: item `i` owns `indices[indptr[i]..indptr[i + 1]]`.
#[derive(Clone, Debug)]
struct ItemMajor {
    indptr: Vec<usize>,
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl ItemMajor {
    fn from_csc(matrix: CsMat<f64>) -> Self {
        let (indptr, indices, values) = matrix.into_raw_storage();
        Self { indptr, indices, values }
    }
}

impl SparseInteractionMatrix {
    /// `(user_count, item_count)`.
    pub fn shape(&self) -> (usize, usize) {
        self.by_user.shape()
    }

    pub fn user_count(&self) -> usize {
        self.by_user.rows()
    }

    pub fn item_count(&self) -> usize {
        self.by_user.cols()
    }

    /// Number of materialized cells; duplicate ratings count once.
    pub fn nnz(&self) -> usize {
        self.by_user.nnz()
    }

    pub fn get(&self, user: usize, item: usize) -> f64 {
        self.by_user.get(user, item).copied().unwrap_or(0.0)
    }

    /// Ratings of one item across all users, or `None` past the last item.
    pub fn item_vector(&self, item: usize) -> Option<ItemVector<'_>> {
        let start = *self.by_item.indptr.get(item)?;
        let end = *self.by_item.indptr.get(item + 1)?;
        Some(ItemVector::new(&self.by_item.indices[start..end], &self.by_item.values[start..end]))
    }

    /// Every item vector in item index order.
    pub fn item_vectors(&self) -> impl Iterator<Item = (usize, ItemVector<'_>)> + '_ {
        (0..self.item_count())
            .filter_map(move |item| self.item_vector(item).map(|vector| (item, vector)))
    }
}

pub struct SparseMatrixBuilder;

impl SparseMatrixBuilder {
    /// Builds the matrix from rating records already covered by both maps.
    ///
    /// Ratings landing on the same `(user, item)` cell are summed. Zero
    /// ratings are skipped since they denote an absent cell.
    pub fn build(
        records: &[RatingRecord],
        user_map: &IdentifierMap,
        item_map: &IdentifierMap,
    ) -> Result<SparseInteractionMatrix, DomainError> {
        let shape = (user_map.len(), item_map.len());
        let mut triplets = TriMat::with_capacity(shape, records.len());

        for record in records {
            if !record.rating.is_finite() {
                return Err(DomainError::InvalidRating {
                    user_id: record.user_id.clone(),
                    item_id: record.item_id.clone(),
                    rating: record.rating,
                });
            }
            let user = resolve(user_map, &record.user_id, IdentifierDomain::User)?;
            let item = resolve(item_map, &record.item_id, IdentifierDomain::Item)?;
            if record.is_rated() {
                triplets.add_triplet(user, item, record.rating);
            }
        }

        let matrix = SparseInteractionMatrix {
            by_user: triplets.to_csr(),
            by_item: ItemMajor::from_csc(triplets.to_csc()),
        };

        info!(
            event_name = "recommend.matrix.built",
            users = shape.0,
            items = shape.1,
            records = records.len(),
            stored_cells = matrix.nnz(),
            "interaction matrix built"
        );

        Ok(matrix)
    }
}

fn resolve(
    map: &IdentifierMap,
    identifier: &str,
    domain: IdentifierDomain,
) -> Result<usize, DomainError> {
    map.index_of(identifier)
        .map_err(|_| DomainError::UnmappedIdentifier { domain, identifier: identifier.to_owned() })
}
