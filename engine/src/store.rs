//! Flat-file roll logs. Single-die sets store `<timestamp> - <value>` per line,
//! multi-die sets and simulations store comma-separated faces per line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use encoding_rs::Encoding;
use serde::Serialize;
use tracing::{debug, warn};

use crate::roll::{DiceSetConfig, Roll, RollHistory};
use crate::simulate::SimulationRun;

pub const SINGLE_DICE_DIR: &str = "SingleDiceResults";
pub const MULTIPLE_DICE_DIR: &str = "MultipleDiceResults";
pub const SIMULATION_DIR: &str = "SimulationResults";
pub const FILE_EXTENSION: &str = "dicegraph";

/// Strip a set name down to something safe for a file name.
pub fn safe_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect::<String>()
        .trim()
        .replace(' ', "_")
}

pub fn format_single_line(timestamp: DateTime<Local>, value: u32) -> String {
    format!("{} - {}", timestamp.to_rfc3339(), value)
}

pub fn format_multi_line(values: &[u32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Values of a single-die log; lines whose last `-` field is not a plain
/// number are ignored.
pub fn parse_single_log(text: &str) -> Vec<u32> {
    text.lines()
        .filter_map(|line| line.trim().rsplit('-').next())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|v| v.parse().ok())
        .collect()
}

pub fn parse_multi_log(text: &str) -> Vec<Vec<u32>> {
    let mut rolls = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parsed: std::result::Result<Vec<u32>, _> =
            line.split(',').map(|v| v.trim().parse::<u32>()).collect();
        match parsed {
            Ok(values) => rolls.push(values),
            Err(e) => warn!(line = lineno + 1, error = %e, "skipping malformed roll line"),
        }
    }
    rolls
}

/// Decode a file honoring a UTF-8/UTF-16 byte-order mark if present.
pub fn read_text_auto(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if let Some((enc, bom_len)) = Encoding::for_bom(&bytes) {
        let (cow, _, _) = enc.decode(&bytes[bom_len..]);
        Ok(cow.into_owned())
    } else {
        String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8", path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationEntry {
    pub name: String,
    pub num_dice: usize,
    pub faces: u32,
    pub num_rolls: usize,
    pub path: PathBuf,
}

fn parse_simulation_stem(stem: &str) -> Option<(String, usize, u32, usize)> {
    let mut parts = stem.rsplitn(3, '_');
    let rolls = parts.next()?.strip_suffix("rolls")?.parse().ok()?;
    let (dice, faces) = parts.next()?.split_once('d')?;
    let name = parts.next()?.replace('_', " ");
    Some((name, dice.parse().ok()?, faces.parse().ok()?, rolls))
}

/// Roll logs rooted at a data directory.
#[derive(Debug, Clone)]
pub struct RollStore {
    root: PathBuf,
}

impl RollStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn sets_dir(&self, num_dice: usize) -> PathBuf {
        if num_dice == 1 {
            self.root.join(SINGLE_DICE_DIR)
        } else {
            self.root.join(MULTIPLE_DICE_DIR)
        }
    }

    /// Log file for a set. Names with no file-safe characters are rejected so
    /// they cannot all land on the same `.dicegraph` file.
    pub fn set_path(&self, config: &DiceSetConfig) -> Result<PathBuf> {
        let safe = safe_name(&config.name);
        if safe.is_empty() {
            bail!("dice set name '{}' has no usable characters", config.name);
        }
        Ok(self
            .sets_dir(config.num_dice)
            .join(format!("{}.{}", safe, FILE_EXTENSION)))
    }

    /// Append one roll to the set's log, checking it against the set first.
    pub fn log_roll(&self, config: &DiceSetConfig, roll: Roll) -> Result<()> {
        let mut check = RollHistory::new(config.clone());
        check.push(roll.clone())?;

        let path = self.set_path(config)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let line = if config.is_single() {
            format_single_line(Local::now(), roll.values()[0])
        } else {
            format_multi_line(roll.values())
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        writeln!(file, "{line}").with_context(|| format!("failed to write {}", path.display()))?;
        debug!(set = %config.name, %line, "logged roll");
        Ok(())
    }

    /// Raw rolls as stored; a set that was never logged reads as empty.
    pub fn read_rolls(&self, config: &DiceSetConfig) -> Result<Vec<Roll>> {
        let path = self.set_path(config)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = read_text_auto(&path)?;
        Ok(if config.is_single() {
            parse_single_log(&text).into_iter().map(Roll::Single).collect()
        } else {
            parse_multi_log(&text).into_iter().map(Roll::Set).collect()
        })
    }

    /// Stored rolls that fit the set's current shape; the rest are skipped.
    pub fn read_history(&self, config: &DiceSetConfig) -> Result<RollHistory> {
        let mut history = RollHistory::new(config.clone());
        for roll in self.read_rolls(config)? {
            if let Err(e) = history.push(roll) {
                warn!(set = %config.name, error = %e, "skipping roll that does not fit the set");
            }
        }
        Ok(history)
    }

    pub fn reset(&self, config: &DiceSetConfig) -> Result<()> {
        let path = self.set_path(config)?;
        if path.exists() {
            fs::write(&path, "").with_context(|| format!("failed to reset {}", path.display()))?;
        }
        Ok(())
    }

    pub fn delete(&self, config: &DiceSetConfig) -> Result<()> {
        let path = self.set_path(config)?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("failed to delete {}", path.display()))?;
        }
        Ok(())
    }

    /// Names of stored sets of the given kind (single vs multiple dice), sorted.
    pub fn list_sets(&self, num_dice: usize) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .entries_with_extension(&self.sets_dir(num_dice))?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn save_simulation(&self, name: &str, run: &SimulationRun) -> Result<PathBuf> {
        let safe = safe_name(name);
        if safe.is_empty() {
            bail!("simulation name '{}' has no usable characters", name);
        }
        let dir = self.root.join(SIMULATION_DIR);
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(format!(
            "{}_{}d{}_{}rolls.{}",
            safe, run.num_dice, run.faces, run.num_rolls, FILE_EXTENSION
        ));
        let mut text = String::new();
        for roll in &run.rolls {
            text.push_str(&format_multi_line(roll));
            text.push('\n');
        }
        fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn list_simulations(&self) -> Result<Vec<SimulationEntry>> {
        let mut sims: Vec<SimulationEntry> = self
            .entries_with_extension(&self.root.join(SIMULATION_DIR))?
            .into_iter()
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                let (name, num_dice, faces, num_rolls) = parse_simulation_stem(stem)?;
                Some(SimulationEntry {
                    name,
                    num_dice,
                    faces,
                    num_rolls,
                    path,
                })
            })
            .collect();
        sims.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(sims)
    }

    pub fn load_simulation(&self, entry: &SimulationEntry) -> Result<SimulationRun> {
        let rolls = parse_multi_log(&read_text_auto(&entry.path)?);
        Ok(SimulationRun {
            num_dice: entry.num_dice,
            faces: entry.faces,
            num_rolls: rolls.len(),
            rolls,
        })
    }

    fn entries_with_extension(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION) {
                out.push(path);
            }
        }
        Ok(out)
    }
}
