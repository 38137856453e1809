use std::sync::Arc;

use crate::domain::{FeatureContribution, LabelResult, ScoreResult};

use super::artifact::ModelArtifact;
use super::vectorizer::FeatureVector;

const ATTRIBUTION_THRESHOLD: f64 = 0.1;
const TOP_FEATURES: usize = 3;

#[derive(Clone)]
pub struct RiskEngine {
    artifact: Arc<ModelArtifact>,
}

impl RiskEngine {
    pub fn new(artifact: Arc<ModelArtifact>) -> Self {
        Self { artifact }
    }

    pub fn labels(&self) -> &[String] {
        self.artifact.labels()
    }

    // No vocabulary hits short-circuits to all-zero; pure biases must not
    // report risk on their own.
    pub fn analyze(&self, text: &str) -> ScoreResult {
        let vector = self.artifact.vectorize(text);
        if vector.is_empty() {
            return ScoreResult::zero(self.artifact.labels());
        }
        self.score(&vector)
    }

    fn score(&self, vector: &FeatureVector) -> ScoreResult {
        let mut detections = Vec::with_capacity(self.artifact.labels().len());
        let mut max_risk_score: f64 = 0.0;

        for (label_index, label) in self.artifact.labels().iter().enumerate() {
            let estimator = self.artifact.estimator(label_index);
            let z: f64 = vector
                .iter()
                .map(|(index, weight)| estimator.weights[*index] * weight)
                .sum::<f64>()
                + estimator.bias;
            let probability = sigmoid(z).clamp(0.0, 1.0);
            max_risk_score = max_risk_score.max(probability);

            let top_features = if probability > ATTRIBUTION_THRESHOLD {
                self.top_features(vector, label_index)
            } else {
                Vec::new()
            };

            detections.push(LabelResult {
                label: label.clone(),
                probability,
                top_features,
            });
        }

        ScoreResult {
            max_risk_score,
            detections,
        }
    }

    // Stable sort (ties keep insertion order), truncate to three, then keep
    // only strictly positive coefficients.
    fn top_features(&self, vector: &FeatureVector, label_index: usize) -> Vec<FeatureContribution> {
        let estimator = self.artifact.estimator(label_index);
        let mut contributions: Vec<FeatureContribution> = vector
            .iter()
            .map(|(index, _)| FeatureContribution {
                word: self.artifact.term(*index).to_string(),
                weight: estimator.weights[*index],
            })
            .collect();
        contributions.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap_or(std::cmp::Ordering::Equal));
        contributions
            .into_iter()
            .take(TOP_FEATURES)
            .filter(|c| c.weight > 0.0)
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RiskEngine {
        let artifact = ModelArtifact::for_tests(
            vec!["urgent", "account", "boss", "password"],
            vec![1.0, 1.0, 1.0, 1.0],
            vec!["urgency", "authority"],
            vec![
                (vec![3.0, 1.0, -0.5, 0.2], -2.0),
                (vec![0.1, -0.3, 4.0, 0.5], -3.0),
            ],
        );
        RiskEngine::new(Arc::new(artifact))
    }

    #[test]
    fn no_vocabulary_hits_score_zero_with_empty_attributions() {
        let result = engine().analyze("hello there friend");
        assert_eq!(result.max_risk_score, 0.0);
        assert_eq!(result.detections.len(), 2);
        for detection in &result.detections {
            assert_eq!(detection.probability, 0.0);
            assert!(detection.top_features.is_empty());
        }
    }

    #[test]
    fn max_risk_score_equals_max_label_probability() {
        let result = engine().analyze("urgent account password boss");
        let max = result
            .detections
            .iter()
            .map(|d| d.probability)
            .fold(0.0_f64, f64::max);
        assert_eq!(result.max_risk_score, max);
    }

    #[test]
    fn detections_follow_artifact_label_order() {
        let result = engine().analyze("urgent");
        assert_eq!(result.detections[0].label, "urgency");
        assert_eq!(result.detections[1].label, "authority");
    }

    #[test]
    fn top_features_are_positive_sorted_and_capped() {
        let result = engine().analyze("urgent account boss password");
        let urgency = &result.detections[0];
        assert!(urgency.probability > 0.5);
        assert!(urgency.top_features.len() <= 3);
        assert!(urgency.top_features.windows(2).all(|w| w[0].weight >= w[1].weight));
        assert!(urgency.top_features.iter().all(|f| f.weight > 0.0));
        // "boss" has a negative urgency coefficient and must never appear.
        assert!(urgency.top_features.iter().all(|f| f.word != "boss"));
        assert_eq!(urgency.top_features[0].word, "urgent");
    }

    #[test]
    fn attribution_skipped_below_threshold() {
        // Strong negative bias keeps authority far below the 0.1 threshold
        // for a text that only carries urgency terms.
        let result = engine().analyze("account");
        let authority = &result.detections[1];
        assert!(authority.probability < ATTRIBUTION_THRESHOLD);
        assert!(authority.top_features.is_empty());
    }

    #[test]
    fn probabilities_are_within_unit_interval() {
        let result = engine().analyze("urgent urgent urgent urgent account password");
        for detection in &result.detections {
            assert!((0.0..=1.0).contains(&detection.probability));
        }
    }
}
