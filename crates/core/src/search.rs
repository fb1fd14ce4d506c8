use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DomainError;
use crate::matrix::ItemVector;
use crate::metric::DistanceMetric;
use crate::model::InteractionModel;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub item_id: String,
    pub distance: f64,
}

/// Up to `k` items closest to `query`, nearest first. Never contains `query`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NeighborResult {
    pub query: String,
    pub neighbors: Vec<Neighbor>,
}

impl NeighborResult {
    pub fn identifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.neighbors.iter().map(|neighbor| neighbor.item_id.as_str())
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Read-only queries against a built [`InteractionModel`].
#[derive(Clone, Copy, Debug)]
pub struct NeighborSearchEngine<'a> {
    model: &'a InteractionModel,
}

impl<'a> NeighborSearchEngine<'a> {
    pub fn new(model: &'a InteractionModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &'a InteractionModel {
        self.model
    }

    pub fn find_similar(
        &self,
        item_id: &str,
        k: usize,
        metric: DistanceMetric,
    ) -> Result<NeighborResult, DomainError> {
        if k == 0 {
            return Err(DomainError::InvalidNeighborCount(k));
        }
        metric.validate()?;

        let items = self.model.items();
        let query_index =
            items.index_of(item_id).map_err(|_| DomainError::UnknownItem(item_id.to_owned()))?;

        let item_count = items.len();
        if k >= item_count {
            return Err(DomainError::InsufficientCandidates {
                requested: k,
                available: item_count - 1,
            });
        }

        let matrix = self.model.matrix();
        let query = matrix
            .item_vector(query_index)
            .ok_or_else(|| DomainError::UnknownItem(item_id.to_owned()))?;

        let mut ranked: Vec<(f64, usize)> = matrix
            .item_vectors()
            .filter(|(index, _)| *index != query_index)
            .map(|(index, candidate)| (metric.distance(&query, &candidate), index))
            .collect();

        if ranked.len() > k {
            ranked.select_nth_unstable_by(k - 1, by_distance_then_index);
            ranked.truncate(k);
        }
        ranked.sort_unstable_by(by_distance_then_index);

        let neighbors = ranked
            .into_iter()
            .map(|(distance, index)| {
                Ok(Neighbor { item_id: items.identifier_at(index)?.to_owned(), distance })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        debug!(
            event_name = "recommend.search.completed",
            item_id,
            k,
            metric = %metric,
            returned = neighbors.len(),
            "neighbor search completed"
        );

        Ok(NeighborResult { query: item_id.to_owned(), neighbors })
    }

    /// Distance between two mapped items under `metric`.
    pub fn distance(
        &self,
        left_id: &str,
        right_id: &str,
        metric: DistanceMetric,
    ) -> Result<f64, DomainError> {
        metric.validate()?;
        let left = self.resolve_vector(left_id)?;
        let right = self.resolve_vector(right_id)?;
        Ok(metric.distance(&left, &right))
    }

    fn resolve_vector(&self, item_id: &str) -> Result<ItemVector<'a>, DomainError> {
        let index = self
            .model
            .items()
            .index_of(item_id)
            .map_err(|_| DomainError::UnknownItem(item_id.to_owned()))?;
        self.model
            .matrix()
            .item_vector(index)
            .ok_or_else(|| DomainError::UnknownItem(item_id.to_owned()))
    }
}

// total order: equal distances fall back to ascending item index
fn by_distance_then_index(left: &(f64, usize), right: &(f64, usize)) -> Ordering {
    left.0.total_cmp(&right.0).then(left.1.cmp(&right.1))
}
