//! Input Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// User-supplied values for one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprenticeInput {
    /// Age in years
    pub age: i64,
    /// Number of complaints filed
    pub complaints: i64,
    /// Socioeconomic stratum
    pub stratum: i64,
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: i64,
    pub max: i64,
}

impl Range {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Every allowed value, for selector-style controls
    pub fn options(&self) -> Vec<i64> {
        (self.min..=self.max).collect()
    }
}

/// Allowed ranges for each input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputLimits {
    /// Age range (years)
    pub age: Range,
    /// Default age shown on the slider
    pub default_age: i64,
    /// Complaint count range
    pub complaints: Range,
    /// Stratum range
    pub stratum: Range,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            age: Range::new(18, 100),
            default_age: 25,
            complaints: Range::new(0, 10),
            stratum: Range::new(1, 6),
        }
    }
}

impl InputLimits {
    /// Reject limits that no value could satisfy
    pub fn check(&self) -> Result<(), ValidationError> {
        for (field, range) in [
            ("age", self.age),
            ("complaints", self.complaints),
            ("stratum", self.stratum),
        ] {
            if range.min > range.max {
                return Err(ValidationError::InvalidLimits {
                    field,
                    min: range.min,
                    max: range.max,
                });
            }
        }
        self.validate_range("default_age", self.default_age, self.age)
    }

    fn validate_range(
        &self,
        field: &'static str,
        value: i64,
        range: Range,
    ) -> Result<(), ValidationError> {
        if range.contains(value) {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.min,
                max: range.max,
            })
        }
    }
}

/// Validator for prediction inputs
#[derive(Debug, Clone, Default)]
pub struct Validator {
    limits: InputLimits,
}

impl Validator {
    /// Create a new validator with given limits
    pub fn new(limits: InputLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &InputLimits {
        &self.limits
    }

    /// Validate age
    pub fn validate_age(&self, age: i64) -> Result<(), ValidationError> {
        self.limits.validate_range("age", age, self.limits.age)
    }

    /// Validate complaint count
    pub fn validate_complaints(&self, complaints: i64) -> Result<(), ValidationError> {
        self.limits
            .validate_range("complaints", complaints, self.limits.complaints)
    }

    /// Validate stratum
    pub fn validate_stratum(&self, stratum: i64) -> Result<(), ValidationError> {
        self.limits.validate_range("stratum", stratum, self.limits.stratum)
    }

    /// Validate all three inputs, reporting the first violation
    pub fn validate(&self, input: &ApprenticeInput) -> Result<(), ValidationError> {
        self.validate_age(input.age)?;
        self.validate_complaints(input.complaints)?;
        self.validate_stratum(input.stratum)?;
        debug!(?input, "Input passed validation");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(age: i64, complaints: i64, stratum: i64) -> ApprenticeInput {
        ApprenticeInput {
            age,
            complaints,
            stratum,
        }
    }

    #[test]
    fn test_valid_age() {
        let validator = Validator::default();
        assert!(validator.validate_age(18).is_ok());
        assert!(validator.validate_age(25).is_ok());
        assert!(validator.validate_age(100).is_ok());
    }

    #[test]
    fn test_invalid_age() {
        let validator = Validator::default();
        assert_eq!(
            validator.validate_age(17),
            Err(ValidationError::OutOfRange {
                field: "age",
                value: 17,
                min: 18,
                max: 100,
            })
        );
        assert!(validator.validate_age(101).is_err());
    }

    #[test]
    fn test_stratum_range() {
        let validator = Validator::default();
        assert!(validator.validate_stratum(1).is_ok());
        assert!(validator.validate_stratum(6).is_ok());
        assert!(validator.validate_stratum(0).is_err());
        assert!(validator.validate_stratum(7).is_err());
    }

    #[test]
    fn test_first_violation_reported() {
        let validator = Validator::default();
        let err = validator.validate(&input(25, 11, 9)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::OutOfRange {
                field: "complaints",
                ..
            }
        ));
    }

    #[test]
    fn test_selector_options() {
        let limits = InputLimits::default();
        assert_eq!(limits.stratum.options(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(limits.complaints.options().len(), 11);
    }

    #[test]
    fn test_limits_check() {
        assert!(InputLimits::default().check().is_ok());

        let inverted = InputLimits {
            stratum: Range::new(6, 1),
            ..Default::default()
        };
        assert!(matches!(
            inverted.check(),
            Err(ValidationError::InvalidLimits { field: "stratum", .. })
        ));

        let bad_default = InputLimits {
            default_age: 10,
            ..Default::default()
        };
        assert!(bad_default.check().is_err());
    }

    proptest! {
        #[test]
        fn prop_in_range_inputs_accepted(
            age in 18i64..=100,
            complaints in 0i64..=10,
            stratum in 1i64..=6,
        ) {
            let validator = Validator::default();
            prop_assert!(validator.validate(&input(age, complaints, stratum)).is_ok());
        }

        #[test]
        fn prop_young_age_rejected(age in i64::MIN..18) {
            let validator = Validator::default();
            prop_assert!(validator.validate(&input(age, 0, 1)).is_err());
        }
    }
}
