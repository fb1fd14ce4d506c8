use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::matrix::ItemVector;

/// How far apart two item rating vectors are. Smaller is more similar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceMetric {
    /// `1 - cosine similarity`; a zero vector has similarity 0 to everything.
    #[default]
    Cosine,
    Euclidean,
    Manhattan,
    /// Generalized L-p distance, `p >= 1`.
    Minkowski { p: f64 },
}

impl DistanceMetric {
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Minkowski { p } if !p.is_finite() || *p < 1.0 => Err(DomainError::InvalidMetric(
                format!("minkowski exponent must be a finite number >= 1, got {p}"),
            )),
            _ => Ok(()),
        }
    }

    pub fn distance(&self, left: &ItemVector<'_>, right: &ItemVector<'_>) -> f64 {
        match self {
            Self::Cosine => cosine_distance(left, right),
            Self::Euclidean => {
                let mut sum = 0.0;
                for_each_pair(left, right, |x, y| sum += (x - y) * (x - y));
                sum.sqrt()
            }
            Self::Manhattan => {
                let mut sum = 0.0;
                for_each_pair(left, right, |x, y| sum += (x - y).abs());
                sum
            }
            Self::Minkowski { p } => {
                let mut sum = 0.0;
                for_each_pair(left, right, |x, y| sum += (x - y).abs().powf(*p));
                sum.powf(p.recip())
            }
        }
    }
}

fn cosine_distance(left: &ItemVector<'_>, right: &ItemVector<'_>) -> f64 {
    let left_norm = left.l2_norm();
    let right_norm = right.l2_norm();
    if left_norm == 0.0 || right_norm == 0.0 {
        return 1.0;
    }

    let mut dot = 0.0;
    for_each_pair(left, right, |x, y| dot += x * y);

    let similarity = (dot / (left_norm * right_norm)).clamp(-1.0, 1.0);
    1.0 - similarity
}

/// Walks the union of stored coordinates of both vectors in ascending index
/// order, passing 0.0 for a coordinate only one side stores.
fn for_each_pair(left: &ItemVector<'_>, right: &ItemVector<'_>, mut visit: impl FnMut(f64, f64)) {
    let (mut i, mut j) = (0, 0);
    let (left_indices, left_values) = (left.indices(), left.values());
    let (right_indices, right_values) = (right.indices(), right.values());

    while i < left_indices.len() && j < right_indices.len() {
        match left_indices[i].cmp(&right_indices[j]) {
            std::cmp::Ordering::Less => {
                visit(left_values[i], 0.0);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                visit(0.0, right_values[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                visit(left_values[i], right_values[j]);
                i += 1;
                j += 1;
            }
        }
    }
    for &value in &left_values[i..] {
        visit(value, 0.0);
    }
    for &value in &right_values[j..] {
        visit(0.0, value);
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cosine => f.write_str("cosine"),
            Self::Euclidean => f.write_str("euclidean"),
            Self::Manhattan => f.write_str("manhattan"),
            Self::Minkowski { p } => write!(f, "minkowski:{p}"),
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let metric = match normalized.as_str() {
            "cosine" => Self::Cosine,
            "euclidean" => Self::Euclidean,
            "manhattan" => Self::Manhattan,
            "minkowski" => Self::Minkowski { p: 2.0 },
            other => match other.strip_prefix("minkowski:") {
                Some(exponent) => {
                    let p = exponent.trim().parse::<f64>().map_err(|_| {
                        DomainError::InvalidMetric(format!(
                            "minkowski exponent `{exponent}` is not a number"
                        ))
                    })?;
                    Self::Minkowski { p }
                }
                None => {
                    return Err(DomainError::InvalidMetric(format!(
                        "unsupported metric `{other}` (expected cosine|euclidean|manhattan|minkowski[:p])"
                    )))
                }
            },
        };

        metric.validate()?;
        Ok(metric)
    }
}

impl TryFrom<String> for DistanceMetric {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DistanceMetric> for String {
    fn from(value: DistanceMetric) -> Self {
        value.to_string()
    }
}
