use serde::{Deserialize, Serialize};

use crate::error::{check_faces, Result, StatsError};

/// One recorded outcome: a single die, or an ordered set of dice thrown together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Roll {
    Single(u32),
    Set(Vec<u32>),
}

impl Roll {
    /// Individual die outcomes in position order.
    pub fn values(&self) -> &[u32] {
        match self {
            Roll::Single(v) => std::slice::from_ref(v),
            Roll::Set(vs) => vs,
        }
    }

    pub fn arity(&self) -> usize {
        self.values().len()
    }

    pub fn sum(&self) -> u64 {
        self.values().iter().map(|&v| v as u64).sum()
    }
}

impl From<u32> for Roll {
    fn from(value: u32) -> Self {
        Roll::Single(value)
    }
}

impl From<Vec<u32>> for Roll {
    fn from(values: Vec<u32>) -> Self {
        Roll::Set(values)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DiceSetConfig {
    pub name: String,
    pub num_dice: usize,
    pub faces: u32,
}

impl DiceSetConfig {
    pub fn new(name: impl Into<String>, num_dice: usize, faces: u32) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StatsError::InvalidConfig(
                "dice set name must not be empty".into(),
            ));
        }
        if num_dice < 1 {
            return Err(StatsError::InvalidNumDice(num_dice));
        }
        check_faces(faces)?;
        Ok(Self {
            name,
            num_dice,
            faces,
        })
    }

    pub fn is_single(&self) -> bool {
        self.num_dice == 1
    }
}

/// Append-only roll log for one dice set. Rolls can be added or the whole
/// history cleared; individual rolls are never edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollHistory {
    config: DiceSetConfig,
    rolls: Vec<Roll>,
}

impl RollHistory {
    pub fn new(config: DiceSetConfig) -> Self {
        Self {
            config,
            rolls: Vec::new(),
        }
    }

    pub fn config(&self) -> &DiceSetConfig {
        &self.config
    }

    pub fn push(&mut self, roll: Roll) -> Result<()> {
        if roll.arity() != self.config.num_dice {
            return Err(StatsError::MixedArity {
                index: self.rolls.len(),
                expected: self.config.num_dice,
                found: roll.arity(),
            });
        }
        if let Some(&value) = roll
            .values()
            .iter()
            .find(|&&v| v < 1 || v > self.config.faces)
        {
            return Err(StatsError::FaceOutOfRange {
                value,
                faces: self.config.faces,
            });
        }
        self.rolls.push(roll);
        Ok(())
    }

    pub fn extend<I>(&mut self, rolls: I) -> Result<()>
    where
        I: IntoIterator<Item = Roll>,
    {
        for roll in rolls {
            self.push(roll)?;
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.rolls.clear();
    }

    pub fn rolls(&self) -> &[Roll] {
        &self.rolls
    }

    pub fn len(&self) -> usize {
        self.rolls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rolls.is_empty()
    }
}

/// Keep only rolls with exactly `arity` dice, e.g. after a set was reconfigured.
pub fn filter_arity(rolls: &[Roll], arity: usize) -> Vec<Roll> {
    rolls
        .iter()
        .filter(|r| r.arity() == arity)
        .cloned()
        .collect()
}
