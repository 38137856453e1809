use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use super::artifact::ModelArtifact;

/// (term index, tf * idf) pairs in first-seen order.
pub type FeatureVector = Vec<(usize, f64)>;

// Same token rule the vocabulary was built with.
static TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"));

impl ModelArtifact {
    // Output is not renormalized per document; the trained weights expect raw tf * idf.
    pub fn vectorize(&self, text: &str) -> FeatureVector {
        let folded = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_REGEX.find_iter(&folded).map(|m| m.as_str()).collect();
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<usize> = Vec::new();
        let mut counts: HashMap<usize, f64> = HashMap::new();
        let mut bump = |index: usize| {
            let count = counts.entry(index).or_insert(0.0);
            if *count == 0.0 {
                order.push(index);
            }
            *count += 1.0;
        };

        for token in &tokens {
            if let Some(index) = self.term_index(token) {
                bump(index);
            }
        }
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            if let Some(index) = self.term_index(&bigram) {
                bump(index);
            }
        }

        order
            .into_iter()
            .map(|index| (index, counts[&index] * self.idf(index)))
            .collect()
    }
}
