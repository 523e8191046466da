//! # forge_intent
//!
//! Classifies a free-text request into a [`UserIntent`]: an intent type plus
//! app type, domain, technologies, feature tags and complexity.
//!
//! Classification is a pure function of the message. It walks the ordered
//! keyword tables in [`tables`]; the first matching row wins for single
//! valued fields and every matching row is reported for lists. The intent
//! priority is debug, explain, modify, feature, then create.
//!
//! ```
//! use forge_intent::{classify, IntentType};
//!
//! let intent = classify("build an app that fixes this bug");
//! assert_eq!(intent.intent_type, IntentType::Debug);
//! ```

pub mod classifier;
pub mod tables;
pub mod types;

pub use classifier::{classify, IntentClassifier};
pub use types::{AppType, Complexity, FeatureTag, IntentType, UserIntent, DEFAULT_DOMAIN};
