use std::fmt;

use serde::{Deserialize, Serialize};

/// Similarity tier assigned to one image.
///
/// Declaration order is the total order: by embedding count needed
/// (`NoFace` < `SinglePerson` < distance tiers), then from most to least
/// similar among the distance tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationLabel {
    NoFace,
    SinglePerson,
    Twins,
    Siblings,
    Similar,
    Different,
}

impl ClassificationLabel {
    pub const ALL: &[ClassificationLabel] = &[
        ClassificationLabel::NoFace,
        ClassificationLabel::SinglePerson,
        ClassificationLabel::Twins,
        ClassificationLabel::Siblings,
        ClassificationLabel::Similar,
        ClassificationLabel::Different,
    ];

    /// Stable machine identifier, as written to results and CSV files.
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationLabel::NoFace => "no_face",
            ClassificationLabel::SinglePerson => "single_person",
            ClassificationLabel::Twins => "twins",
            ClassificationLabel::Siblings => "siblings",
            ClassificationLabel::Similar => "similar",
            ClassificationLabel::Different => "different",
        }
    }

    /// Whether this tier is derived from a pair distance.
    pub fn is_distance_based(self) -> bool {
        !matches!(
            self,
            ClassificationLabel::NoFace | ClassificationLabel::SinglePerson
        )
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
