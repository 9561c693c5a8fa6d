use crate::classification::domain::classification_result::ClassificationResult;
use crate::classification::domain::distance::{euclidean_distance, ClassifyError};
use crate::classification::domain::pair_classifier::PairClassifier;
use crate::classification::domain::thresholds::Thresholds;
use crate::shared::embedding::Embedding;

/// Classifies all faces found in one image.
///
/// With more than two faces, every unordered pair is compared (O(N^2), fine
/// for per-photo face counts) and the closest pair decides the label. This
/// is a heuristic: the closest pair is the likeliest twin/sibling candidate,
/// not a statement about the whole group.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupClassifier {
    pair: PairClassifier,
}

impl GroupClassifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            pair: PairClassifier::new(thresholds),
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.pair.thresholds()
    }

    pub fn classify(&self, embeddings: &[Embedding]) -> Result<ClassificationResult, ClassifyError> {
        match embeddings {
            [] => Ok(ClassificationResult::no_face()),
            [_] => Ok(ClassificationResult::single_person()),
            [a, b] => self.pair.classify(a, b),
            _ => {
                let (_, _, min_distance) = closest_pair(embeddings)?;
                let mut result = self.pair.classify_distance(min_distance);
                result.detail.faces_count = Some(embeddings.len());
                result.detail.min_pair_distance = Some(min_distance);
                Ok(result)
            }
        }
    }
}

/// Returns `(i, j, distance)` of the closest pair, `i < j`.
///
/// Pairs are visited in ascending `(i, j)` order and only a strictly smaller
/// distance replaces the current best, so exact ties keep the first pair.
/// Requires at least two embeddings.
pub fn closest_pair(embeddings: &[Embedding]) -> Result<(usize, usize, f64), ClassifyError> {
    let mut best = (0, 1, f64::INFINITY);
    for i in 0..embeddings.len() {
        for j in (i + 1)..embeddings.len() {
            let d = euclidean_distance(&embeddings[i], &embeddings[j])?;
            if d < best.2 {
                best = (i, j, d);
            }
        }
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::domain::label::ClassificationLabel;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn emb(values: &[f64]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    #[test]
    fn test_empty_is_no_face() {
        let result = GroupClassifier::default().classify(&[]).unwrap();
        assert_eq!(result.label, ClassificationLabel::NoFace);
        assert_eq!(result.distance, None);
        assert!(result.detail.is_empty());
    }

    #[test]
    fn test_single_is_single_person() {
        let result = GroupClassifier::default()
            .classify(&[emb(&[0.1, 0.2])])
            .unwrap();
        assert_eq!(result.label, ClassificationLabel::SinglePerson);
        assert_eq!(result.distance, None);
        assert!(result.detail.is_empty());
    }

    #[test]
    fn test_pair_delegates_without_detail() {
        let result = GroupClassifier::default()
            .classify(&[emb(&[0.0, 0.0]), emb(&[0.0, 0.5])])
            .unwrap();
        assert_eq!(result.label, ClassificationLabel::Siblings);
        assert_relative_eq!(result.distance.unwrap(), 0.5);
        assert!(result.detail.is_empty());
    }

    #[test]
    fn test_group_uses_closest_pair() {
        // 0-1: 1.0, 0-2: 2.0, 1-2: 0.3 -> closest is (1, 2)
        let embeddings = [emb(&[0.0]), emb(&[1.0]), emb(&[1.3])];
        let result = GroupClassifier::default().classify(&embeddings).unwrap();
        assert_eq!(result.label, ClassificationLabel::Twins);
        assert_relative_eq!(result.distance.unwrap(), 0.3, epsilon = 1e-12);
        assert_eq!(result.detail.faces_count, Some(3));
        assert_relative_eq!(result.detail.min_pair_distance.unwrap(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_closest_pair_tie_keeps_first_in_index_order() {
        // (0,1), (1,2) and (2,3) are all exactly 1.0 apart
        let embeddings = [emb(&[0.0]), emb(&[1.0]), emb(&[2.0]), emb(&[3.0])];
        let (i, j, d) = closest_pair(&embeddings).unwrap();
        assert_eq!((i, j), (0, 1));
        assert_eq!(d, 1.0);
    }

    #[test]
    fn test_group_dimension_mismatch_fails() {
        let embeddings = [emb(&[0.0, 0.0]), emb(&[1.0, 0.0]), emb(&[1.0])];
        let err = GroupClassifier::default().classify(&embeddings).unwrap_err();
        assert!(matches!(err, ClassifyError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_min_pair_distance_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        let classifier = GroupClassifier::default();
        for _ in 0..50 {
            let n = rng.random_range(3..9);
            let embeddings: Vec<Embedding> = (0..n)
                .map(|_| Embedding::new((0..16).map(|_| rng.random_range(-0.5..0.5)).collect()))
                .collect();

            let mut expected = f64::INFINITY;
            for a in &embeddings {
                for b in &embeddings {
                    if !std::ptr::eq(a, b) {
                        expected = expected.min(euclidean_distance(a, b).unwrap());
                    }
                }
            }

            let result = classifier.classify(&embeddings).unwrap();
            assert_eq!(result.detail.faces_count, Some(n));
            assert_eq!(result.detail.min_pair_distance, Some(expected));
            assert_eq!(result.distance, Some(expected));
            assert_eq!(result.label, classifier.thresholds().label_for(expected));
        }
    }
}
