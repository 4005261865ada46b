use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::aggregate::FaceCounts;
use crate::fairness::FairnessVerdict;
use crate::validity::SampleValidity;

/// Everything a presentation layer shows for one dice set, bundled as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    pub fairness_test: FairnessVerdict,
    /// Individual die outcomes, so a roll of N dice counts N times.
    pub total_rolls: u64,
    pub face_counts: FaceCounts,
    pub face_percentages: BTreeMap<u32, f64>,
    pub sample_validity: SampleValidity,
}

impl FairnessReport {
    pub fn new(
        fairness_test: FairnessVerdict,
        face_counts: FaceCounts,
        face_percentages: BTreeMap<u32, f64>,
        sample_validity: SampleValidity,
    ) -> Self {
        Self {
            fairness_test,
            total_rolls: sample_validity.total,
            face_counts,
            face_percentages,
            sample_validity,
        }
    }

    pub fn is_fair(&self) -> Option<bool> {
        self.fairness_test.is_fair
    }

    /// Plain-text statistics view.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let v = &self.sample_validity;
        let t = &self.fairness_test;

        let _ = writeln!(out, "Dice Statistics Analysis");
        let _ = writeln!(out, "========================");
        let _ = writeln!(out, "Total rolls: {}", self.total_rolls);
        let _ = writeln!(
            out,
            "Sample size: {} ({} of {} required)",
            if v.valid { "valid" } else { "insufficient" },
            v.total,
            v.min_required
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Face  Count  Percent");
        for (face, count) in self.face_counts.iter() {
            let pct = self.face_percentages.get(&face).copied().unwrap_or(0.0);
            let _ = writeln!(out, "{face:>4}  {count:>5}  {pct:>6.2}%");
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Chi-square test (α = {:.3})", t.alpha);
        let _ = writeln!(out, "  χ² statistic: {}", fmt_opt(t.chi2_statistic));
        let _ = writeln!(out, "  p-value:      {}", fmt_opt(t.p_value));
        let verdict = match t.is_fair {
            Some(true) => "FAIR",
            Some(false) => "NOT FAIR",
            None => "UNDETERMINED",
        };
        let _ = writeln!(out, "  Verdict:      {verdict}");
        let _ = writeln!(out, "  {}", t.conclusion);
        let _ = write!(out, "  {}", t.significance);
        out
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(x) => format!("{x:.3}"),
        None => "n/a".to_string(),
    }
}
