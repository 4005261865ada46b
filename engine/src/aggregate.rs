//! Turning raw rolls into per-face counts, percentages, per-position counts
//! and the distribution of roll sums.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{check_faces, Result, StatsError};
use crate::roll::Roll;

/// Occurrences of every face `1..=faces`, zero-filled and ordered by face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceCounts(BTreeMap<u32, u64>);

impl FaceCounts {
    pub fn zeroed(faces: u32) -> Self {
        Self((1..=faces).map(|f| (f, 0)).collect())
    }

    /// Counts for faces `1..=counts.len()` taken in order.
    pub fn from_slice(counts: &[u64]) -> Self {
        Self(
            counts
                .iter()
                .enumerate()
                .map(|(i, &c)| (i as u32 + 1, c))
                .collect(),
        )
    }

    fn record(&mut self, value: u32, faces: u32) -> Result<()> {
        match self.0.get_mut(&value) {
            Some(count) => {
                *count += 1;
                Ok(())
            }
            None => Err(StatsError::FaceOutOfRange { value, faces }),
        }
    }

    pub fn get(&self, face: u32) -> u64 {
        self.0.get(&face).copied().unwrap_or(0)
    }

    pub fn faces(&self) -> u32 {
        self.0.len() as u32
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Observed counts in face order, the shape the chi-square routine takes.
    pub fn to_vec(&self) -> Vec<u64> {
        self.0.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.0.iter().map(|(&f, &c)| (f, c))
    }

    pub fn percentages(&self) -> BTreeMap<u32, f64> {
        let total = self.total();
        self.iter()
            .map(|(face, count)| {
                let pct = if total > 0 {
                    count as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                (face, pct)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub face_counts: FaceCounts,
    pub total: u64,
    pub percentages: BTreeMap<u32, f64>,
}

/// Flatten every roll into its individual outcomes and count them per face.
/// A roll of N dice contributes N outcomes.
pub fn aggregate(rolls: &[Roll], faces: u32) -> Result<Aggregate> {
    check_faces(faces)?;
    let mut face_counts = FaceCounts::zeroed(faces);
    for roll in rolls {
        for &value in roll.values() {
            face_counts.record(value, faces)?;
        }
    }
    let total = face_counts.total();
    let percentages = face_counts.percentages();
    debug!(rolls = rolls.len(), total, faces, "aggregated rolls");
    Ok(Aggregate {
        face_counts,
        total,
        percentages,
    })
}

/// Counts per die position. Every roll must have the same arity; callers
/// holding a mixed history filter it with [`crate::roll::filter_arity`] first.
pub fn per_position_counts(rolls: &[Roll], faces: u32) -> Result<BTreeMap<usize, FaceCounts>> {
    check_faces(faces)?;
    let Some(first) = rolls.first() else {
        return Ok(BTreeMap::new());
    };
    let arity = first.arity();
    let mut positions: BTreeMap<usize, FaceCounts> =
        (0..arity).map(|p| (p, FaceCounts::zeroed(faces))).collect();

    for (index, roll) in rolls.iter().enumerate() {
        if roll.arity() != arity {
            return Err(StatsError::MixedArity {
                index,
                expected: arity,
                found: roll.arity(),
            });
        }
        for (pos, &value) in roll.values().iter().enumerate() {
            if let Some(counts) = positions.get_mut(&pos) {
                counts.record(value, faces)?;
            }
        }
    }
    Ok(positions)
}

/// How often each per-roll sum occurred, covering every sum from the smallest
/// to the largest observed (inclusive), with zeros for gaps. Faces outside
/// `1..=faces` are rejected, which bounds the span by `arity * faces`.
pub fn sum_distribution(rolls: &[Roll], faces: u32) -> Result<BTreeMap<u64, u64>> {
    check_faces(faces)?;
    if let Some(&value) = rolls
        .iter()
        .flat_map(|r| r.values())
        .find(|&&v| v < 1 || v > faces)
    {
        return Err(StatsError::FaceOutOfRange { value, faces });
    }
    let sums: Vec<u64> = rolls.iter().map(Roll::sum).collect();
    let (Some(&min), Some(&max)) = (sums.iter().min(), sums.iter().max()) else {
        return Ok(BTreeMap::new());
    };
    let mut dist: BTreeMap<u64, u64> = (min..=max).map(|s| (s, 0)).collect();
    for s in sums {
        *dist.entry(s).or_insert(0) += 1;
    }
    Ok(dist)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SumSummary {
    pub mean: f64,
    pub min: u64,
    pub max: u64,
}

pub fn summary_statistics(rolls: &[Roll]) -> Option<SumSummary> {
    if rolls.is_empty() {
        return None;
    }
    let sums = rolls.iter().map(Roll::sum);
    let min = sums.clone().min()?;
    let max = sums.clone().max()?;
    let mean = sums.sum::<u64>() as f64 / rolls.len() as f64;
    Some(SumSummary { mean, min, max })
}
