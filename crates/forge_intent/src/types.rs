//! Intent types produced by the classifier.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse category of a user request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    CreateApp,
    ModifyCode,
    Debug,
    Explain,
    GenerateFeature,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateApp => "create_app",
            Self::ModifyCode => "modify_code",
            Self::Debug => "debug",
            Self::Explain => "explain",
            Self::GenerateFeature => "generate_feature",
        }
    }
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Application category inferred from keywords.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum AppType {
    #[serde(rename = "e-commerce")]
    ECommerce,
    Social,
    Dashboard,
    Blog,
    Portfolio,
    Todo,
    Game,
    Education,
    Finance,
    /// Generic default supplied downstream when nothing matched
    WebApp,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ECommerce => "e-commerce",
            Self::Social => "social",
            Self::Dashboard => "dashboard",
            Self::Blog => "blog",
            Self::Portfolio => "portfolio",
            Self::Todo => "todo",
            Self::Game => "game",
            Self::Education => "education",
            Self::Finance => "finance",
            Self::WebApp => "web-app",
        }
    }

    /// Human-readable label used as a plan's `type`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ECommerce => "E-commerce",
            Self::Social => "Social Network",
            Self::Dashboard => "Dashboard",
            Self::Blog => "Blog",
            Self::Portfolio => "Portfolio",
            Self::Todo => "Productivity",
            Self::Game => "Game",
            Self::Education => "Education",
            Self::Finance => "Finance",
            Self::WebApp => "Web Application",
        }
    }
}

impl fmt::Display for AppType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature tag inferred from keywords.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FeatureTag {
    Authentication,
    Payment,
    Search,
    Chat,
    Analytics,
    Api,
    Database,
    Responsive,
}

impl FeatureTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "authentication",
            Self::Payment => "payment",
            Self::Search => "search",
            Self::Chat => "chat",
            Self::Analytics => "analytics",
            Self::Api => "api",
            Self::Database => "database",
            Self::Responsive => "responsive",
        }
    }

    /// Feature line shown in plans.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Authentication => "User registration and login",
            Self::Payment => "Secure payment processing",
            Self::Search => "Search and filtering",
            Self::Chat => "Real-time messaging",
            Self::Analytics => "Analytics dashboard with charts",
            Self::Api => "REST API integration",
            Self::Database => "Persistent data storage",
            Self::Responsive => "Responsive mobile-friendly layout",
        }
    }
}

impl fmt::Display for FeatureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rough size of the request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
}

impl Complexity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label used when no domain word matched.
pub const DEFAULT_DOMAIN: &str = "general";

/// Classified request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserIntent {
    #[serde(rename = "type")]
    pub intent_type: IntentType,
    /// The original message, verbatim
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_type: Option<AppType>,
    pub domain: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub features: Vec<FeatureTag>,
    #[serde(default)]
    pub complexity: Complexity,
}

impl UserIntent {
    /// App type, or [`AppType::WebApp`] when none was detected.
    pub fn app_type_or_default(&self) -> AppType {
        self.app_type.unwrap_or(AppType::WebApp)
    }

    pub fn is_creation(&self) -> bool {
        self.intent_type == IntentType::CreateApp
    }
}
