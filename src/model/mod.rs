pub mod artifact;
pub mod scorer;
pub mod vectorizer;

pub use artifact::{ArtifactError, ModelArtifact};
pub use scorer::RiskEngine;
pub use vectorizer::FeatureVector;
