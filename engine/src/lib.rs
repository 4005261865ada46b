//! Dice roll statistics: per-face aggregation, sample-size gating and a
//! chi-square fairness test against a uniform die, plus the simulation,
//! storage and preference pieces the front ends share.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fairness;
pub mod gamma;
pub mod report;
pub mod roll;
pub mod simulate;
pub mod store;
pub mod validity;

pub use aggregate::{
    aggregate, per_position_counts, sum_distribution, summary_statistics, Aggregate, FaceCounts,
    SumSummary,
};
pub use config::Preferences;
pub use error::{Result, StatsError};
pub use fairness::{
    analyze_fairness, chi_square, ChiSquare, FairnessAnalyzer, FairnessTester, FairnessVerdict,
    DEFAULT_ALPHA,
};
pub use report::FairnessReport;
pub use roll::{filter_arity, DiceSetConfig, Roll, RollHistory};
pub use simulate::{simulate, simulate_run, simulate_weighted, Dice, SimulationRun};
pub use store::RollStore;
pub use validity::{is_valid, SampleValidity, ValidityChecker};
