use serde::{Deserialize, Serialize};

use crate::classification::domain::label::ClassificationLabel;
use crate::shared::config::ConfigError;

pub const DEFAULT_TWINS: f64 = 0.40;
pub const DEFAULT_SIBLINGS: f64 = 0.55;
pub const DEFAULT_SIMILAR: f64 = 0.60;

/// Upper bounds (inclusive) of the three distance tiers.
///
/// Together they split `[0, inf)` into `[0, twins]`, `(twins, siblings]`,
/// `(siblings, similar]` and `(similar, inf)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub twins: f64,
    pub siblings: f64,
    pub similar: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            twins: DEFAULT_TWINS,
            siblings: DEFAULT_SIBLINGS,
            similar: DEFAULT_SIMILAR,
        }
    }
}

impl Thresholds {
    pub fn new(twins: f64, siblings: f64, similar: f64) -> Result<Self, ConfigError> {
        let ordered = twins.is_finite()
            && siblings.is_finite()
            && similar.is_finite()
            && 0.0 <= twins
            && twins < siblings
            && siblings < similar;
        if !ordered {
            return Err(ConfigError::InvalidThresholds {
                twins,
                siblings,
                similar,
            });
        }
        Ok(Self {
            twins,
            siblings,
            similar,
        })
    }

    /// Maps a distance to its tier. Equality falls into the more similar tier.
    pub fn label_for(&self, distance: f64) -> ClassificationLabel {
        if distance <= self.twins {
            ClassificationLabel::Twins
        } else if distance <= self.siblings {
            ClassificationLabel::Siblings
        } else if distance <= self.similar {
            ClassificationLabel::Similar
        } else {
            ClassificationLabel::Different
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, ClassificationLabel::Twins)]
    #[case(0.40, ClassificationLabel::Twins)]
    #[case(0.4000001, ClassificationLabel::Siblings)]
    #[case(0.55, ClassificationLabel::Siblings)]
    #[case(0.56, ClassificationLabel::Similar)]
    #[case(0.60, ClassificationLabel::Similar)]
    #[case(0.6000001, ClassificationLabel::Different)]
    #[case(3.0, ClassificationLabel::Different)]
    fn test_label_for_default_boundaries(#[case] distance: f64, #[case] expected: ClassificationLabel) {
        assert_eq!(Thresholds::default().label_for(distance), expected);
    }

    #[test]
    fn test_label_for_is_monotonic() {
        let t = Thresholds::default();
        let mut previous = t.label_for(0.0);
        for step in 1..=1000 {
            let current = t.label_for(step as f64 * 0.001);
            assert!(current >= previous, "tier went back at step {step}");
            previous = current;
        }
    }

    #[rstest]
    #[case(-0.1, 0.5, 0.6)]
    #[case(0.5, 0.5, 0.6)]
    #[case(0.4, 0.7, 0.6)]
    #[case(0.4, 0.5, f64::INFINITY)]
    #[case(f64::NAN, 0.5, 0.6)]
    fn test_new_rejects_invalid(#[case] twins: f64, #[case] siblings: f64, #[case] similar: f64) {
        assert!(matches!(
            Thresholds::new(twins, siblings, similar),
            Err(ConfigError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn test_new_accepts_zero_lower_bound() {
        let t = Thresholds::new(0.0, 0.1, 0.2).unwrap();
        assert_eq!(t.label_for(0.0), ClassificationLabel::Twins);
        assert_eq!(t.label_for(0.05), ClassificationLabel::Siblings);
    }
}
