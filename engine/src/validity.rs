use serde::{Deserialize, Serialize};

/// Classical rule of thumb: every category should expect at least 5 hits.
pub const DEFAULT_MIN_EXPECTED: u64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleValidity {
    pub valid: bool,
    pub total: u64,
    pub min_required: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

/// Decides whether a sample is large enough for the chi-square approximation.
/// Under a uniform null each face expects `total / faces`, so the sample is
/// valid when `total >= min_expected_per_face * faces`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityChecker {
    pub min_expected_per_face: u64,
}

impl Default for ValidityChecker {
    fn default() -> Self {
        Self {
            min_expected_per_face: DEFAULT_MIN_EXPECTED,
        }
    }
}

impl ValidityChecker {
    pub fn new(min_expected_per_face: u64) -> Self {
        Self {
            min_expected_per_face,
        }
    }

    pub fn check(&self, observed: &[u64]) -> SampleValidity {
        let total: u64 = observed.iter().sum();
        let min_required = self
            .min_expected_per_face
            .saturating_mul(observed.len() as u64);
        let valid = total >= min_required;
        let message = if valid {
            String::new()
        } else {
            format!(
                "Not enough data for reliable fairness test. \
                 Need at least {} rolls (currently have {}).",
                min_required, total
            )
        };
        SampleValidity {
            valid,
            total,
            min_required,
            message,
        }
    }
}

/// Validity under the default threshold of 5 expected per face.
pub fn is_valid(observed: &[u64]) -> SampleValidity {
    ValidityChecker::default().check(observed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_valid() {
        let v = is_valid(&[5, 5, 5, 5, 5, 5]);
        assert!(v.valid);
        assert_eq!(v.total, 30);
        assert_eq!(v.min_required, 30);
        assert!(v.message.is_empty());
    }

    #[test]
    fn one_short_is_invalid() {
        let v = is_valid(&[5, 5, 5, 5, 5, 4]);
        assert!(!v.valid);
        assert_eq!(
            v.message,
            "Not enough data for reliable fairness test. Need at least 30 rolls (currently have 29)."
        );
    }

    #[test]
    fn stricter_threshold() {
        let checker = ValidityChecker::new(10);
        assert!(!checker.check(&[10, 10, 9]).valid);
        assert!(checker.check(&[10, 10, 10]).valid);
    }

    #[test]
    fn huge_threshold_saturates() {
        let v = ValidityChecker::new(u64::MAX).check(&[1, 2, 3]);
        assert!(!v.valid);
        assert_eq!(v.min_required, u64::MAX);
    }
}
