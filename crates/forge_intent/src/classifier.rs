//! Message classification.

use tracing::debug;

use crate::tables::{
    all_matches, first_match, APP_TYPE_RULES, COMPLEXITY_RULES, DEFAULT_INTENT, DOMAINS,
    FEATURE_RULES, INTENT_RULES, TECHNOLOGIES,
};
use crate::types::{UserIntent, DEFAULT_DOMAIN};

/// Stateless keyword-table classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a message. Never fails; unmatched fields get defaults.
    pub fn classify(&self, message: &str) -> UserIntent {
        let text = message.to_lowercase();

        let intent = UserIntent {
            intent_type: first_match(INTENT_RULES, &text).unwrap_or(DEFAULT_INTENT),
            description: message.to_string(),
            app_type: first_match(APP_TYPE_RULES, &text),
            domain: detect_domain(&text),
            technologies: detect_technologies(&text),
            features: all_matches(FEATURE_RULES, &text),
            complexity: first_match(COMPLEXITY_RULES, &text).unwrap_or_default(),
        };

        debug!(
            intent = %intent.intent_type,
            app_type = ?intent.app_type,
            features = intent.features.len(),
            "Classified message"
        );
        intent
    }
}

/// Shorthand for `IntentClassifier.classify(message)`.
pub fn classify(message: &str) -> UserIntent {
    IntentClassifier.classify(message)
}

fn detect_domain(text: &str) -> String {
    DOMAINS
        .iter()
        .find(|d| text.contains(*d))
        .copied()
        .unwrap_or(DEFAULT_DOMAIN)
        .to_string()
}

fn detect_technologies(text: &str) -> Vec<String> {
    TECHNOLOGIES
        .iter()
        .filter(|t| text.contains(*t))
        .map(|t| t.to_string())
        .collect()
}
