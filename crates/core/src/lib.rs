//! Item-item collaborative filtering for book recommendations.
//!
//! Ratings go into an [`InteractionModel`] (identifier maps plus a sparse
//! user x item matrix) built once per run. Queries borrow the model:
//! [`NeighborSearchEngine`] finds the items nearest to one seed, and
//! [`RecommendationAssembler`] runs a batch of seeds, reporting unknown
//! seeds as skipped instead of failing.

pub mod assembler;
pub mod config;
pub mod errors;
pub mod logging;
pub mod mapping;
pub mod matrix;
pub mod metric;
pub mod model;
pub mod ratings;
pub mod search;

pub use assembler::{AssemblerOptions, RecommendationAssembler, Recommendations, SuggestionRow};
pub use errors::{ApplicationError, DomainError, IdentifierDomain};
pub use mapping::IdentifierMap;
pub use matrix::{ItemVector, SparseInteractionMatrix, SparseMatrixBuilder};
pub use metric::DistanceMetric;
pub use model::InteractionModel;
pub use ratings::{compose_item_key, retain_rated, RatingRecord};
pub use search::{Neighbor, NeighborResult, NeighborSearchEngine};
