use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{check_faces, Result, StatsError};
use crate::roll::Roll;

/// Seedable source of die faces.
pub struct Dice {
    rng: ChaCha8Rng,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// One uniform face in `1..=faces`.
    pub fn roll(&mut self, faces: u32) -> u32 {
        self.rng.gen_range(1..=faces)
    }

    pub fn roll_set(&mut self, num_dice: usize, faces: u32) -> Vec<u32> {
        (0..num_dice).map(|_| self.roll(faces)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub num_dice: usize,
    pub faces: u32,
    pub num_rolls: usize,
    pub rolls: Vec<Vec<u32>>,
}

impl SimulationRun {
    pub fn to_rolls(&self) -> Vec<Roll> {
        self.rolls.iter().cloned().map(Roll::Set).collect()
    }
}

fn check_shape(num_dice: usize, faces: u32) -> Result<()> {
    if num_dice < 1 {
        return Err(StatsError::InvalidNumDice(num_dice));
    }
    check_faces(faces)
}

/// `num_rolls` tuples of `num_dice` independent uniform faces.
pub fn simulate(
    dice: &mut Dice,
    num_rolls: usize,
    num_dice: usize,
    faces: u32,
) -> Result<Vec<Vec<u32>>> {
    check_shape(num_dice, faces)?;
    debug!(num_rolls, num_dice, faces, "simulating rolls");
    Ok((0..num_rolls)
        .map(|_| dice.roll_set(num_dice, faces))
        .collect())
}

pub fn simulate_run(
    dice: &mut Dice,
    num_rolls: usize,
    num_dice: usize,
    faces: u32,
) -> Result<SimulationRun> {
    let rolls = simulate(dice, num_rolls, num_dice, faces)?;
    Ok(SimulationRun {
        num_dice,
        faces,
        num_rolls,
        rolls,
    })
}

/// Like [`simulate`] but face `i + 1` comes up with relative weight `weights[i]`.
/// Used to produce known-biased data.
pub fn simulate_weighted(
    dice: &mut Dice,
    num_rolls: usize,
    num_dice: usize,
    weights: &[f64],
) -> Result<Vec<Vec<u32>>> {
    check_shape(num_dice, weights.len() as u32)?;
    let dist = WeightedIndex::new(weights)
        .map_err(|e| StatsError::InvalidProbabilities(e.to_string()))?;
    Ok((0..num_rolls)
        .map(|_| {
            (0..num_dice)
                .map(|_| dist.sample(&mut dice.rng) as u32 + 1)
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_rolls() {
        let a = simulate(&mut Dice::from_seed(7), 20, 3, 6).unwrap();
        let b = simulate(&mut Dice::from_seed(7), 20, 3, 6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_shape() {
        let mut dice = Dice::from_seed(1);
        assert!(matches!(
            simulate(&mut dice, 5, 0, 6),
            Err(StatsError::InvalidNumDice(0))
        ));
        assert!(matches!(
            simulate(&mut dice, 5, 1, 1),
            Err(StatsError::InvalidFaces(1))
        ));
        assert!(simulate_weighted(&mut dice, 5, 1, &[0.0, 0.0]).is_err());
    }

    #[test]
    fn weighted_never_draws_zero_weight_faces() {
        let mut dice = Dice::from_seed(3);
        let rolls = simulate_weighted(&mut dice, 200, 2, &[0.0, 1.0, 0.0, 3.0]).unwrap();
        assert!(rolls.iter().flatten().all(|&v| v == 2 || v == 4));
    }
}
