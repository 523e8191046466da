//! Behavioural tests for the intent priority chain.

use forge_intent::{classify, AppType, Complexity, IntentType};

/// Debug keywords win over every other keyword family.
#[test]
fn test_debug_keywords_always_win() {
    let messages = [
        "build an app that fixes this bug",
        "Create a shop, but first fix the checkout",
        "Explain why this throws an error",
        "add a feature to debug the login",
        "my dashboard is broken",
        "the game is not working after I changed the component",
    ];
    for message in messages {
        assert_eq!(
            classify(message).intent_type,
            IntentType::Debug,
            "expected debug for {message:?}"
        );
    }
}

/// Explain beats modify and feature keywords.
#[test]
fn test_explain_beats_modify() {
    assert_eq!(
        classify("how do I add a new route?").intent_type,
        IntentType::Explain
    );
    assert_eq!(
        classify("what does this component render").intent_type,
        IntentType::Explain
    );
}

/// Modify beats feature keywords.
#[test]
fn test_modify_beats_feature() {
    assert_eq!(
        classify("update the payment component").intent_type,
        IntentType::ModifyCode
    );
}

/// Complexity is always one of the three labels.
#[test]
fn test_complexity_is_total() {
    let messages = [
        "",
        "Build a todo app",
        "a basic blog",
        "a comprehensive finance suite",
        "🚀🚀🚀",
        "SIMPLE",
    ];
    for message in messages {
        let complexity = classify(message).complexity;
        assert!(matches!(
            complexity,
            Complexity::Simple | Complexity::Moderate | Complexity::Complex
        ));
    }
    assert_eq!(classify("Build a todo app").complexity, Complexity::Moderate);
    assert_eq!(classify("SIMPLE").complexity, Complexity::Simple);
}

/// Classification is deterministic.
#[test]
fn test_classification_is_pure() {
    let message = "Build an advanced React store with Stripe payments and search";
    let a = classify(message);
    let b = classify(message);
    assert_eq!(a, b);
    assert_eq!(a.app_type, Some(AppType::ECommerce));
    assert_eq!(a.technologies, vec!["react", "stripe"]);
    assert_eq!(a.complexity, Complexity::Complex);
}
