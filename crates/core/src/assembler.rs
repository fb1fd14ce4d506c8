use std::collections::HashSet;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::errors::DomainError;
use crate::metric::DistanceMetric;
use crate::search::{NeighborResult, NeighborSearchEngine};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AssemblerOptions {
    pub metric: DistanceMetric,
    /// Run per-seed queries on the rayon pool.
    pub parallel: bool,
}

/// Outcome of one batch: suggestions and skipped seeds, both in seed order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub suggestions: IndexMap<String, NeighborResult>,
    pub skipped: Vec<String>,
}

impl Recommendations {
    /// One flat row per suggested seed, for tabular export.
    pub fn rows(&self) -> Vec<SuggestionRow> {
        self.suggestions
            .iter()
            .map(|(seed, result)| SuggestionRow {
                recently_read: seed.clone(),
                suggestions: result.identifiers().map(str::to_owned).collect(),
            })
            .collect()
    }
}

/// Serializes as `{"recently_read": .., "suggestion_1": .., "suggestion_2": ..}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestionRow {
    pub recently_read: String,
    pub suggestions: Vec<String>,
}

impl Serialize for SuggestionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.suggestions.len() + 1))?;
        map.serialize_entry("recently_read", &self.recently_read)?;
        for (position, suggestion) in self.suggestions.iter().enumerate() {
            map.serialize_entry(&format!("suggestion_{}", position + 1), suggestion)?;
        }
        map.end()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RecommendationAssembler<'a> {
    engine: NeighborSearchEngine<'a>,
    options: AssemblerOptions,
}

impl<'a> RecommendationAssembler<'a> {
    pub fn new(engine: NeighborSearchEngine<'a>, options: AssemblerOptions) -> Self {
        Self { engine, options }
    }

    pub fn options(&self) -> AssemblerOptions {
        self.options
    }

    /// Finds `k` neighbors for every seed.
    ///
    /// Seeds that are unknown or have too few candidates land in `skipped`;
    /// any other failure aborts the whole batch. A seed listed more than once
    /// is reported once, at its first position.
    pub fn assemble<S>(&self, seed_items: &[S], k: usize) -> Result<Recommendations, DomainError>
    where
        S: AsRef<str>,
    {
        if k == 0 {
            return Err(DomainError::InvalidNeighborCount(k));
        }
        let metric = self.options.metric;
        metric.validate()?;

        let mut seen = HashSet::new();
        let seeds: Vec<&str> = seed_items
            .iter()
            .map(|seed| seed.as_ref())
            .filter(|seed| seen.insert(*seed))
            .collect();

        let outcomes: Vec<Result<NeighborResult, DomainError>> = if self.options.parallel {
            seeds.par_iter().map(|seed| self.engine.find_similar(seed, k, metric)).collect()
        } else {
            seeds.iter().map(|seed| self.engine.find_similar(seed, k, metric)).collect()
        };

        let mut recommendations = Recommendations::default();
        for (seed, outcome) in seeds.into_iter().zip(outcomes) {
            match outcome {
                Ok(result) => {
                    recommendations.suggestions.insert(seed.to_owned(), result);
                }
                Err(error) if error.is_recoverable() => {
                    warn!(
                        event_name = "recommend.assemble.seed_skipped",
                        seed,
                        reason = %error,
                        "seed item skipped"
                    );
                    recommendations.skipped.push(seed.to_owned());
                }
                Err(error) => return Err(error),
            }
        }

        info!(
            event_name = "recommend.assemble.completed",
            k,
            metric = %metric,
            parallel = self.options.parallel,
            suggested = recommendations.suggestions.len(),
            skipped = recommendations.skipped.len(),
            "recommendation batch assembled"
        );

        Ok(recommendations)
    }
}
