//! Keyword tables driving classification.
//!
//! Every table is an ordered list of `(keywords, label)` pairs. Matching is a
//! lowercase substring test, so e.g. `"fix"` also matches `"prefix"`. The
//! tables are small and hand-picked; they are heuristics, not language
//! understanding.

use crate::types::{AppType, Complexity, FeatureTag, IntentType};

/// Intent priority chain. Earlier rows win; no match means `CreateApp`.
pub const INTENT_RULES: &[(&[&str], IntentType)] = &[
    (
        &["error", "bug", "fix", "debug", "broken", "not working", "crash", "exception"],
        IntentType::Debug,
    ),
    (
        &["explain", "what", "how", "why", "understand"],
        IntentType::Explain,
    ),
    (
        &["add", "modify", "change", "update", "edit", "refactor", "rename"],
        IntentType::ModifyCode,
    ),
    (
        &["feature", "function", "component", "implement"],
        IntentType::GenerateFeature,
    ),
];

/// Intent used when no rule matches.
pub const DEFAULT_INTENT: IntentType = IntentType::CreateApp;

/// App categories. First matching row wins.
pub const APP_TYPE_RULES: &[(&[&str], AppType)] = &[
    (
        &["shop", "store", "ecommerce", "commerce", "buy", "sell", "product", "cart"],
        AppType::ECommerce,
    ),
    (
        &["social", "friend", "follow", "community", "network"],
        AppType::Social,
    ),
    (
        &["dashboard", "admin", "metrics", "monitor"],
        AppType::Dashboard,
    ),
    (&["blog", "article", "post"], AppType::Blog),
    (&["portfolio", "resume", "showcase"], AppType::Portfolio),
    (&["todo", "to-do", "task", "checklist"], AppType::Todo),
    (&["game", "puzzle", "arcade"], AppType::Game),
    (
        &["learn", "course", "education", "school", "student", "lesson"],
        AppType::Education,
    ),
    (
        &["finance", "budget", "expense", "bank", "invest"],
        AppType::Finance,
    ),
];

/// Domain words. First match wins; none means [`crate::DEFAULT_DOMAIN`].
pub const DOMAINS: &[&str] = &[
    "technology",
    "business",
    "education",
    "health",
    "entertainment",
    "finance",
    "food",
    "travel",
    "sports",
    "fashion",
    "music",
    "real estate",
];

/// Technology names reported when mentioned, in this order.
pub const TECHNOLOGIES: &[&str] = &[
    "react",
    "vue",
    "angular",
    "svelte",
    "next.js",
    "node",
    "express",
    "typescript",
    "javascript",
    "python",
    "django",
    "flask",
    "mongodb",
    "postgresql",
    "mysql",
    "sqlite",
    "redis",
    "graphql",
    "tailwind",
    "bootstrap",
    "firebase",
    "stripe",
    "docker",
];

/// Feature tags. All matching rows are reported.
pub const FEATURE_RULES: &[(&[&str], FeatureTag)] = &[
    (
        &["login", "auth", "sign up", "signup", "register", "account"],
        FeatureTag::Authentication,
    ),
    (
        &["payment", "checkout", "billing", "stripe", "subscription"],
        FeatureTag::Payment,
    ),
    (&["search", "filter"], FeatureTag::Search),
    (&["chat", "messaging", "message"], FeatureTag::Chat),
    (
        &["analytics", "chart", "statistics", "report"],
        FeatureTag::Analytics,
    ),
    (&["api", "rest", "endpoint", "integration"], FeatureTag::Api),
    (&["database", "storage", "persist", "sql"], FeatureTag::Database),
    (&["responsive", "mobile", "tablet"], FeatureTag::Responsive),
];

/// Complexity rows, complex before simple.
pub const COMPLEXITY_RULES: &[(&[&str], Complexity)] = &[
    (
        &["complex", "advanced", "enterprise", "scalable", "comprehensive", "full-featured"],
        Complexity::Complex,
    ),
    (
        &["simple", "basic", "minimal", "quick", "small"],
        Complexity::Simple,
    ),
];

/// First label whose keyword set hits `text` (already lowercased).
pub fn first_match<T: Copy>(table: &[(&[&str], T)], text: &str) -> Option<T> {
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| text.contains(k)))
        .map(|(_, label)| *label)
}

/// Every label whose keyword set hits `text`, table order, no duplicates.
pub fn all_matches<T: Copy + PartialEq>(table: &[(&[&str], T)], text: &str) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for (keywords, label) in table {
        if keywords.iter().any(|k| text.contains(k)) && !out.contains(label) {
            out.push(*label);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_respects_order() {
        // e-commerce is checked before blog
        assert_eq!(
            first_match(APP_TYPE_RULES, "a shop post"),
            Some(AppType::ECommerce)
        );
        assert_eq!(first_match(APP_TYPE_RULES, "a blog post"), Some(AppType::Blog));
        assert_eq!(first_match(APP_TYPE_RULES, "hello world"), None);
    }

    #[test]
    fn test_all_matches_deduplicates() {
        let hits = all_matches(FEATURE_RULES, "stripe checkout with login");
        assert_eq!(hits, vec![FeatureTag::Authentication, FeatureTag::Payment]);
    }

    #[test]
    fn test_tables_are_lowercase() {
        let mut keywords: Vec<&str> = Vec::new();
        for (k, _) in INTENT_RULES {
            keywords.extend_from_slice(k);
        }
        for (k, _) in APP_TYPE_RULES {
            keywords.extend_from_slice(k);
        }
        for (k, _) in FEATURE_RULES {
            keywords.extend_from_slice(k);
        }
        for (k, _) in COMPLEXITY_RULES {
            keywords.extend_from_slice(k);
        }
        keywords.extend_from_slice(DOMAINS);
        keywords.extend_from_slice(TECHNOLOGIES);

        for keyword in keywords {
            assert_eq!(keyword, keyword.to_lowercase(), "keyword {keyword} must be lowercase");
        }
    }
}
