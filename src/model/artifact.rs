use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::config::ModelConfig;

/// Trained vocabulary plus one linear estimator per label. Loaded once at
/// startup; a new artifact requires a restart.
#[derive(Debug)]
pub struct ModelArtifact {
    terms: Vec<String>,
    index: HashMap<String, usize>,
    idf: Vec<f64>,
    labels: Vec<String>,
    estimators: Vec<LabelWeights>,
}

#[derive(Debug)]
pub struct LabelWeights {
    pub weights: Vec<f64>,
    pub bias: f64,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid artifact: {0}")]
    Shape(String),
}

#[derive(Deserialize)]
struct VocabularyFile {
    terms: Vec<String>,
    idf: Vec<f64>,
}

// Weight files come in two shapes: a label-keyed map, or a list of estimators
// parallel to `label_order`. Both normalize to the same internal form.
#[derive(Deserialize)]
struct WeightsFile {
    label_order: Vec<String>,
    #[serde(default)]
    labels: Option<HashMap<String, RawLabelWeights>>,
    #[serde(default)]
    estimators: Option<Vec<RawEstimator>>,
}

#[derive(Deserialize)]
struct RawLabelWeights {
    weights: Vec<f64>,
    bias: f64,
}

#[derive(Deserialize)]
struct RawEstimator {
    coef: Vec<f64>,
    intercept: f64,
}

impl ModelArtifact {
    pub fn load(config: &ModelConfig) -> Result<Self, ArtifactError> {
        let dir = Path::new(&config.model_dir);
        let vocabulary: VocabularyFile = read_json(&dir.join(&config.vocabulary_filename))?;
        let weights: WeightsFile = read_json(&dir.join(&config.weights_filename))?;
        Self::from_parts(vocabulary, weights)
    }

    fn from_parts(vocabulary: VocabularyFile, weights: WeightsFile) -> Result<Self, ArtifactError> {
        if vocabulary.terms.len() != vocabulary.idf.len() {
            return Err(ArtifactError::Shape(format!(
                "vocabulary has {} terms but {} idf weights",
                vocabulary.terms.len(),
                vocabulary.idf.len()
            )));
        }
        if weights.label_order.is_empty() {
            return Err(ArtifactError::Shape("label_order is empty".to_string()));
        }

        let estimators = normalize_weights(&weights, vocabulary.terms.len())?;

        let index = vocabulary
            .terms
            .iter()
            .enumerate()
            .map(|(i, term)| (term.clone(), i))
            .collect();

        tracing::info!(
            target: "model",
            terms = vocabulary.terms.len(),
            labels = weights.label_order.len(),
            "model artifact loaded"
        );

        Ok(Self {
            terms: vocabulary.terms,
            index,
            idf: vocabulary.idf,
            labels: weights.label_order,
            estimators,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn term(&self, index: usize) -> &str {
        &self.terms[index]
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self, index: usize) -> f64 {
        self.idf[index]
    }

    pub fn estimator(&self, label_index: usize) -> &LabelWeights {
        &self.estimators[label_index]
    }

    #[cfg(test)]
    pub(crate) fn for_tests(
        terms: Vec<&str>,
        idf: Vec<f64>,
        labels: Vec<&str>,
        estimators: Vec<(Vec<f64>, f64)>,
    ) -> Self {
        let vocabulary = VocabularyFile {
            terms: terms.into_iter().map(str::to_string).collect(),
            idf,
        };
        let weights = WeightsFile {
            label_order: labels.into_iter().map(str::to_string).collect(),
            labels: None,
            estimators: Some(
                estimators
                    .into_iter()
                    .map(|(coef, intercept)| RawEstimator { coef, intercept })
                    .collect(),
            ),
        };
        Self::from_parts(vocabulary, weights).expect("test artifact is well-formed")
    }
}

fn normalize_weights(
    weights: &WeightsFile,
    vocab_size: usize,
) -> Result<Vec<LabelWeights>, ArtifactError> {
    let mut estimators = Vec::with_capacity(weights.label_order.len());

    if let Some(by_label) = &weights.labels {
        for label in &weights.label_order {
            let raw = by_label.get(label).ok_or_else(|| {
                ArtifactError::Shape(format!("label {label} missing from weights map"))
            })?;
            estimators.push(LabelWeights {
                weights: raw.weights.clone(),
                bias: raw.bias,
            });
        }
    } else if let Some(raw_estimators) = &weights.estimators {
        if raw_estimators.len() != weights.label_order.len() {
            return Err(ArtifactError::Shape(format!(
                "{} estimators for {} labels",
                raw_estimators.len(),
                weights.label_order.len()
            )));
        }
        for raw in raw_estimators {
            estimators.push(LabelWeights {
                weights: raw.coef.clone(),
                bias: raw.intercept,
            });
        }
    } else {
        return Err(ArtifactError::Shape(
            "weights file has neither a labels map nor an estimators list".to_string(),
        ));
    }

    for (label, estimator) in weights.label_order.iter().zip(&estimators) {
        if estimator.weights.len() != vocab_size {
            return Err(ArtifactError::Shape(format!(
                "label {label} has {} weights for a vocabulary of {vocab_size}",
                estimator.weights.len()
            )));
        }
    }

    Ok(estimators)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
        path: display,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocabulary() -> VocabularyFile {
        VocabularyFile {
            terms: vec!["urgent".to_string(), "account".to_string()],
            idf: vec![1.2, 1.0],
        }
    }

    #[test]
    fn map_and_estimator_shapes_normalize_identically() {
        let map_form = WeightsFile {
            label_order: vec!["urgency".to_string()],
            labels: Some(HashMap::from([(
                "urgency".to_string(),
                RawLabelWeights {
                    weights: vec![0.8, 0.3],
                    bias: -1.0,
                },
            )])),
            estimators: None,
        };
        let list_form = WeightsFile {
            label_order: vec!["urgency".to_string()],
            labels: None,
            estimators: Some(vec![RawEstimator {
                coef: vec![0.8, 0.3],
                intercept: -1.0,
            }]),
        };

        let a = ModelArtifact::from_parts(vocabulary(), map_form).unwrap();
        let b = ModelArtifact::from_parts(vocabulary(), list_form).unwrap();
        assert_eq!(a.estimator(0).weights, b.estimator(0).weights);
        assert_eq!(a.estimator(0).bias, b.estimator(0).bias);
    }

    #[test]
    fn weight_length_mismatch_is_rejected() {
        let weights = WeightsFile {
            label_order: vec!["urgency".to_string()],
            labels: None,
            estimators: Some(vec![RawEstimator {
                coef: vec![0.8],
                intercept: 0.0,
            }]),
        };
        let err = ModelArtifact::from_parts(vocabulary(), weights).unwrap_err();
        assert!(matches!(err, ArtifactError::Shape(_)));
    }

    #[test]
    fn idf_length_mismatch_is_rejected() {
        let vocabulary = VocabularyFile {
            terms: vec!["urgent".to_string()],
            idf: vec![1.0, 2.0],
        };
        let weights = WeightsFile {
            label_order: vec!["urgency".to_string()],
            labels: None,
            estimators: Some(vec![RawEstimator {
                coef: vec![0.8],
                intercept: 0.0,
            }]),
        };
        assert!(ModelArtifact::from_parts(vocabulary, weights).is_err());
    }

    #[test]
    fn load_reads_artifact_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("vocabulary.json"),
            r#"{"terms": ["urgent"], "idf": [1.5]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("weights.json"),
            r#"{"label_order": ["urgency"], "estimators": [{"coef": [2.0], "intercept": -0.5}]}"#,
        )
        .unwrap();

        let config = ModelConfig {
            model_dir: dir.path().display().to_string(),
            vocabulary_filename: "vocabulary.json".to_string(),
            weights_filename: "weights.json".to_string(),
        };
        let artifact = ModelArtifact::load(&config).unwrap();
        assert_eq!(artifact.labels(), ["urgency"]);
        assert_eq!(artifact.term_index("urgent"), Some(0));
        assert_eq!(artifact.idf(0), 1.5);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let config = ModelConfig {
            model_dir: "/nonexistent-model-dir".to_string(),
            vocabulary_filename: "vocabulary.json".to_string(),
            weights_filename: "weights.json".to_string(),
        };
        assert!(matches!(
            ModelArtifact::load(&config).unwrap_err(),
            ArtifactError::Io { .. }
        ));
    }
}
