//! Chi-square goodness-of-fit against a uniform die, and the gated
//! `analyze_fairness` entry point that UI and storage collaborators call.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::{aggregate, FaceCounts};
use crate::error::{check_alpha, check_faces, Result, StatsError};
use crate::gamma::chi_square_sf;
use crate::report::FairnessReport;
use crate::roll::Roll;
use crate::validity::{SampleValidity, ValidityChecker};

pub const DEFAULT_ALPHA: f64 = 0.05;

const PROBABILITY_SUM_TOLERANCE: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChiSquare {
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: usize,
}

/// Pearson chi-square test of `observed` against `expected_probs`
/// (uniform when `None`). Degrees of freedom are `categories - 1`.
pub fn chi_square(observed: &[u64], expected_probs: Option<&[f64]>) -> Result<ChiSquare> {
    let k = observed.len();
    if k < 2 {
        return Err(StatsError::InvalidFaces(k as u32));
    }
    let degrees_of_freedom = k - 1;
    let total: u64 = observed.iter().sum();
    if total == 0 {
        return Ok(ChiSquare {
            statistic: 0.0,
            p_value: 1.0,
            degrees_of_freedom,
        });
    }

    if let Some(p) = expected_probs {
        check_probabilities(p, k)?;
    }
    // total / k rather than total * (1 / k) keeps exactly uniform counts at 0
    let expected_at = |i: usize| match expected_probs {
        Some(p) => total as f64 * p[i],
        None => total as f64 / k as f64,
    };

    let mut statistic = 0.0;
    for (i, &obs) in observed.iter().enumerate() {
        let expected = expected_at(i);
        if expected <= 0.0 {
            if obs == 0 {
                continue;
            }
            return Err(StatsError::DegenerateExpectation(i));
        }
        let diff = obs as f64 - expected;
        statistic += diff * diff / expected;
    }

    let p_value = chi_square_sf(statistic, degrees_of_freedom as f64)?;
    debug!(statistic, p_value, degrees_of_freedom, "chi-square test");
    Ok(ChiSquare {
        statistic,
        p_value,
        degrees_of_freedom,
    })
}

fn check_probabilities(probs: &[f64], k: usize) -> Result<()> {
    if probs.len() != k {
        return Err(StatsError::LengthMismatch {
            expected: k,
            found: probs.len(),
        });
    }
    if let Some(p) = probs.iter().find(|p| !p.is_finite() || **p < 0.0) {
        return Err(StatsError::InvalidProbabilities(format!(
            "probability {p} is not a finite non-negative number"
        )));
    }
    let sum: f64 = probs.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(StatsError::InvalidProbabilities(format!(
            "probabilities sum to {sum}, not 1"
        )));
    }
    Ok(())
}

/// Outcome of a fairness test. `is_fair` and `p_value` are `None` whenever no
/// judgement can be made (no data, too little data, numerical failure).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessVerdict {
    pub chi2_statistic: Option<f64>,
    pub p_value: Option<f64>,
    pub alpha: f64,
    pub is_fair: Option<bool>,
    pub conclusion: String,
    pub significance: String,
    pub confidence_level: f64,
    pub sample_valid: bool,
}

impl FairnessVerdict {
    /// Classify a p-value at significance `alpha`; ties count as fair.
    pub fn interpret(p_value: f64, alpha: f64) -> Self {
        let is_fair = p_value >= alpha;
        let confidence_level = (1.0 - alpha) * 100.0;
        let (conclusion, significance) = if is_fair {
            (
                format!("The dice appear to be fair (p={p_value:.3} ≥ α={alpha:.3})"),
                format!(
                    "No significant deviation from fairness at {confidence_level:.1}% confidence level"
                ),
            )
        } else {
            (
                format!("The dice may not be fair (p={p_value:.3} < α={alpha:.3})"),
                format!(
                    "Statistically significant deviation from fairness at {confidence_level:.1}% confidence level"
                ),
            )
        };
        Self {
            chi2_statistic: None,
            p_value: Some(p_value),
            alpha,
            is_fair: Some(is_fair),
            conclusion,
            significance,
            confidence_level,
            sample_valid: true,
        }
    }

    pub fn insufficient_data(alpha: f64, validity: &SampleValidity) -> Self {
        Self {
            chi2_statistic: None,
            p_value: None,
            alpha,
            is_fair: None,
            conclusion: validity.message.clone(),
            significance: "Insufficient data for statistical inference".into(),
            confidence_level: (1.0 - alpha) * 100.0,
            sample_valid: false,
        }
    }

    fn no_rolls(alpha: f64) -> Self {
        Self {
            chi2_statistic: Some(0.0),
            p_value: None,
            alpha,
            is_fair: None,
            conclusion: "No rolls recorded; fairness cannot be determined".into(),
            significance: "Insufficient data for statistical inference".into(),
            confidence_level: (1.0 - alpha) * 100.0,
            sample_valid: false,
        }
    }

    fn undetermined(alpha: f64, sample_valid: bool, reason: &StatsError) -> Self {
        Self {
            chi2_statistic: None,
            p_value: None,
            alpha,
            is_fair: None,
            conclusion: format!("Unable to determine fairness: {reason}"),
            significance: "Cannot determine fairness".into(),
            confidence_level: (1.0 - alpha) * 100.0,
            sample_valid,
        }
    }
}

/// Ungated chi-square fairness test at a fixed significance level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairnessTester {
    alpha: f64,
}

impl FairnessTester {
    pub fn new(alpha: f64) -> Result<Self> {
        check_alpha(alpha)?;
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Test observed per-face counts against a uniform die. Only a malformed
    /// count vector is an error; numerical trouble yields an undetermined verdict.
    ///
    /// An all-zero vector yields `chi2_statistic = Some(0.0)` but `p_value` and
    /// `is_fair` of `None`. With no rolls there is nothing to judge, and a
    /// p-value of 1.0 next to an undecided verdict would break
    /// `is_fair == (p_value >= alpha)`. Call [`chi_square`] directly for the
    /// raw `(0, 1.0)` result.
    pub fn test(&self, observed: &[u64]) -> Result<FairnessVerdict> {
        check_faces(observed.len() as u32)?;
        let sample_valid = ValidityChecker::default().check(observed).valid;
        if observed.iter().sum::<u64>() == 0 {
            return Ok(FairnessVerdict::no_rolls(self.alpha));
        }
        Ok(self.verdict(chi_square(observed, None), sample_valid))
    }

    pub(crate) fn verdict(
        &self,
        outcome: Result<ChiSquare>,
        sample_valid: bool,
    ) -> FairnessVerdict {
        match outcome {
            Ok(result) => {
                let mut verdict = FairnessVerdict::interpret(result.p_value, self.alpha);
                verdict.chi2_statistic = Some(result.statistic);
                verdict.sample_valid = sample_valid;
                verdict
            }
            Err(err) => {
                warn!(error = %err, "chi-square evaluation failed");
                FairnessVerdict::undetermined(self.alpha, sample_valid, &err)
            }
        }
    }
}

/// Gated analysis: aggregation, sample-size check, then the chi-square test
/// only when the sample is large enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FairnessAnalyzer {
    tester: FairnessTester,
    validity: ValidityChecker,
}

impl FairnessAnalyzer {
    pub fn new(alpha: f64) -> Result<Self> {
        Ok(Self {
            tester: FairnessTester::new(alpha)?,
            validity: ValidityChecker::default(),
        })
    }

    pub fn with_validity(mut self, validity: ValidityChecker) -> Result<Self> {
        if validity.min_expected_per_face == 0 {
            return Err(StatsError::InvalidConfig(
                "minimum expected count per face must be at least 1".into(),
            ));
        }
        self.validity = validity;
        Ok(self)
    }

    pub fn alpha(&self) -> f64 {
        self.tester.alpha()
    }

    pub fn analyze(&self, rolls: &[Roll], faces: u32) -> Result<FairnessReport> {
        let agg = aggregate(rolls, faces)?;
        self.analyze_counts(agg.face_counts)
    }

    pub fn analyze_counts(&self, face_counts: FaceCounts) -> Result<FairnessReport> {
        check_faces(face_counts.faces())?;
        let observed = face_counts.to_vec();
        let sample_validity = self.validity.check(&observed);
        let fairness_test = if sample_validity.valid {
            let mut verdict = self.tester.test(&observed)?;
            verdict.sample_valid = true;
            verdict
        } else {
            debug!(
                total = sample_validity.total,
                min_required = sample_validity.min_required,
                "sample too small for chi-square"
            );
            FairnessVerdict::insufficient_data(self.alpha(), &sample_validity)
        };
        let face_percentages = face_counts.percentages();
        Ok(FairnessReport::new(
            fairness_test,
            face_counts,
            face_percentages,
            sample_validity,
        ))
    }
}

/// Primary entry point: full fairness report for `rolls` of `faces`-sided dice.
pub fn analyze_fairness(rolls: &[Roll], faces: u32, alpha: f64) -> Result<FairnessReport> {
    check_faces(faces)?;
    FairnessAnalyzer::new(alpha)?.analyze(rolls, faces)
}
