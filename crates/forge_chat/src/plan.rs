//! Application plans and their synthesis.
//!
//! [`synthesize_plan`] turns whatever the generation backend said into a
//! plan. Extraction runs as a `Result` stage; any extraction error falls
//! through to [`heuristic_plan`], which always succeeds. Plans from either
//! path have non-empty `features` and `technologies` and at least one
//! preview section.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use forge_intent::{AppType, UserIntent};

/// Display-only summary of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanPreview {
    pub title: String,
    pub description: String,
    pub sections: Vec<String>,
}

/// The proposal shown to and approved by the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplicationPlan {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub plan_type: String,
    pub features: Vec<String>,
    pub technologies: Vec<String>,
    pub preview: PlanPreview,
}

impl ApplicationPlan {
    /// Description handed to the file generator after approval.
    pub fn build_description(&self) -> String {
        let mut out = format!("{}: {}\nType: {}\n", self.name, self.description, self.plan_type);
        out.push_str("Features:\n");
        for feature in &self.features {
            out.push_str(&format!("- {}\n", feature));
        }
        out.push_str(&format!("Technologies: {}\n", self.technologies.join(", ")));
        out.push_str(&format!("Sections: {}\n", self.preview.sections.join(", ")));
        out
    }

    /// Markdown summary for chat output.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {}\n\n{}\n\n**Type:** {}\n\n### Features\n", self.name, self.description, self.plan_type);
        for feature in &self.features {
            out.push_str(&format!("- {}\n", feature));
        }
        out.push_str("\n### Technologies\n");
        for tech in &self.technologies {
            out.push_str(&format!("- {}\n", tech));
        }
        out.push_str("\n### Preview\n");
        out.push_str(&format!("{}: {}\n", self.preview.title, self.preview.description));
        for section in &self.preview.sections {
            out.push_str(&format!("- {}\n", section));
        }
        out
    }
}

/// Where a plan came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Backend,
    Heuristic,
}

/// Why backend content could not be used.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlanExtractionError {
    #[error("no backend content")]
    NoContent,

    #[error("no JSON object found in backend content")]
    NoJson,

    #[error("no JSON object matched the plan shape: {0}")]
    Invalid(String),
}

/// Plan shape accepted from the backend. Only `name` and `description` are
/// required; gaps are filled in during normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedPlan {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub preview: Option<ExtractedPreview>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedPreview {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<String>,
}

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("fenced JSON pattern is valid")
});

/// Upper bound on balanced spans handed to the JSON parser.
pub const MAX_PLAN_CANDIDATES: usize = 32;

/// Find a plan object embedded in free text.
///
/// Fenced blocks are tried first, then every balanced `{...}` span in the
/// order it appears.
pub fn extract_plan(raw: Option<&str>) -> Result<ExtractedPlan, PlanExtractionError> {
    let text = raw
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(PlanExtractionError::NoContent)?;

    let mut candidates: Vec<&str> = FENCED_JSON
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();
    candidates.extend(balanced_objects(text));
    candidates.truncate(MAX_PLAN_CANDIDATES);

    if candidates.is_empty() {
        return Err(PlanExtractionError::NoJson);
    }

    let mut last_error = String::new();
    for candidate in candidates {
        match serde_json::from_str::<ExtractedPlan>(candidate) {
            Ok(plan) if !plan.name.trim().is_empty() => return Ok(plan),
            Ok(_) => last_error = "plan name is empty".to_string(),
            Err(e) => last_error = e.to_string(),
        }
    }
    Err(PlanExtractionError::Invalid(last_error))
}

/// Balanced `{...}` spans ordered by start position, string-literal aware.
///
/// One pass over the text with a stack of open braces. Quotes only count
/// inside an open object. At most [`MAX_PLAN_CANDIDATES`] spans are kept.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut open: Vec<usize> = Vec::new();
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes().iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' if !open.is_empty() => in_string = true,
            b'{' => open.push(i),
            b'}' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
        .into_iter()
        .take(MAX_PLAN_CANDIDATES)
        .map(|(start, end)| &text[start..=end])
        .collect()
}

/// Keyword-triggered plan template.
struct PlanTemplate {
    triggers: &'static [&'static str],
    app_types: &'static [AppType],
    name: &'static str,
    description: &'static str,
    plan_type: &'static str,
    features: &'static [&'static str],
    technologies: &'static [&'static str],
    sections: &'static [&'static str],
}

impl PlanTemplate {
    fn matches(&self, text: &str, intent: &UserIntent) -> bool {
        self.triggers.iter().any(|t| text.contains(t))
            || intent
                .app_type
                .map(|a| self.app_types.contains(&a))
                .unwrap_or(false)
    }

    fn to_plan(&self) -> ApplicationPlan {
        ApplicationPlan {
            name: self.name.to_string(),
            description: self.description.to_string(),
            plan_type: self.plan_type.to_string(),
            features: to_strings(self.features),
            technologies: to_strings(self.technologies),
            preview: PlanPreview {
                title: self.name.to_string(),
                description: self.description.to_string(),
                sections: to_strings(self.sections),
            },
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Ordered templates; first match wins.
const TEMPLATES: &[PlanTemplate] = &[
    PlanTemplate {
        triggers: &["candy", "sweet"],
        app_types: &[],
        name: "Sweet Treats Candy Store",
        description: "An online confectionery shop where customers browse, order and gift handmade candy.",
        plan_type: "E-commerce",
        features: &[
            "Product catalog with candy categories",
            "Shopping cart and checkout",
            "Custom gift box builder",
            "Customer reviews and ratings",
            "Order tracking",
            "Responsive design for mobile shoppers",
        ],
        technologies: &["React", "Node.js", "Express", "Stripe", "CSS3"],
        sections: &[
            "Hero banner with featured sweets",
            "Candy categories",
            "Best sellers",
            "Gift boxes",
            "Customer reviews",
        ],
    },
    PlanTemplate {
        triggers: &["surfboard", "surf"],
        app_types: &[],
        name: "Wave Rider Surf Shop",
        description: "A surf shop storefront for boards, gear and lesson bookings, with live surf conditions.",
        plan_type: "E-commerce",
        features: &[
            "Surfboard catalog with size and skill filters",
            "Gear and wetsuit shop",
            "Surf lesson booking",
            "Live surf conditions widget",
            "Shopping cart and checkout",
            "Responsive design",
        ],
        technologies: &["React", "Node.js", "Express", "MongoDB", "CSS3"],
        sections: &[
            "Hero with wave video",
            "Featured boards",
            "Lessons",
            "Surf report",
            "Contact",
        ],
    },
    PlanTemplate {
        triggers: &["blog", "content"],
        app_types: &[AppType::Blog],
        name: "Content Hub CMS",
        description: "A content management system for writing, organizing and publishing articles.",
        plan_type: "Content Management",
        features: &[
            "Rich text article editor",
            "Categories and tags",
            "Draft and publish workflow",
            "Comment system",
            "Author profiles",
            "SEO-friendly URLs",
        ],
        technologies: &["React", "Node.js", "Express", "MongoDB", "Markdown"],
        sections: &[
            "Featured articles",
            "Latest posts",
            "Categories",
            "About the authors",
        ],
    },
    PlanTemplate {
        triggers: &["todo", "to-do", "task"],
        app_types: &[AppType::Todo],
        name: "TaskFlow Todo Manager",
        description: "A task management app for capturing, prioritizing and completing daily work.",
        plan_type: "Productivity",
        features: &[
            "Create, edit and delete tasks",
            "Due dates and reminders",
            "Priority levels and tags",
            "Filter by status",
            "Progress overview",
            "Local storage persistence",
        ],
        technologies: &["React", "JavaScript", "CSS3", "LocalStorage"],
        sections: &[
            "Task input",
            "Task list",
            "Filters",
            "Progress summary",
        ],
    },
];

const DEFAULT_FEATURES: &[&str] = &[
    "Modern landing page",
    "Responsive navigation",
    "Contact form",
    "Accessible, clean UI",
];

const DEFAULT_TECHNOLOGIES: &[&str] = &["React", "Node.js", "Express", "CSS3"];

const DEFAULT_SECTIONS: &[&str] = &["Hero", "Features", "About", "Contact"];

/// Display label for a technology keyword.
pub fn technology_label(tech: &str) -> String {
    let known = match tech {
        "react" => "React",
        "vue" => "Vue.js",
        "angular" => "Angular",
        "svelte" => "Svelte",
        "next.js" => "Next.js",
        "node" => "Node.js",
        "express" => "Express",
        "typescript" => "TypeScript",
        "javascript" => "JavaScript",
        "python" => "Python",
        "django" => "Django",
        "flask" => "Flask",
        "mongodb" => "MongoDB",
        "postgresql" => "PostgreSQL",
        "mysql" => "MySQL",
        "sqlite" => "SQLite",
        "redis" => "Redis",
        "graphql" => "GraphQL",
        "tailwind" => "Tailwind CSS",
        "bootstrap" => "Bootstrap",
        "firebase" => "Firebase",
        "stripe" => "Stripe",
        "docker" => "Docker",
        other => {
            let mut chars = other.chars();
            return match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            };
        }
    };
    known.to_string()
}

fn clip(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push_str("...");
    out
}

fn generic_plan(intent: &UserIntent) -> ApplicationPlan {
    let app_type = intent.app_type_or_default();
    let label = app_type.display_name();
    let name = format!("Custom {}", label);

    let request = clip(&intent.description, 120);
    let description = if request.is_empty() {
        format!("A {} {} tailored to your idea.", intent.complexity, label.to_lowercase())
    } else {
        format!(
            "A {} {} based on your request: {}",
            intent.complexity,
            label.to_lowercase(),
            request
        )
    };

    let mut features: Vec<String> = intent
        .features
        .iter()
        .map(|f| f.describe().to_string())
        .collect();
    for default in DEFAULT_FEATURES {
        if !features.iter().any(|f| f == default) {
            features.push(default.to_string());
        }
    }

    let technologies = if intent.technologies.is_empty() {
        to_strings(DEFAULT_TECHNOLOGIES)
    } else {
        intent.technologies.iter().map(|t| technology_label(t)).collect()
    };

    ApplicationPlan {
        preview: PlanPreview {
            title: name.clone(),
            description: description.clone(),
            sections: to_strings(DEFAULT_SECTIONS),
        },
        name,
        description,
        plan_type: label.to_string(),
        features,
        technologies,
    }
}

/// Deterministic local plan. Never fails.
pub fn heuristic_plan(intent: &UserIntent) -> ApplicationPlan {
    let text = intent.description.to_lowercase();
    TEMPLATES
        .iter()
        .find(|t| t.matches(&text, intent))
        .map(PlanTemplate::to_plan)
        .unwrap_or_else(|| generic_plan(intent))
}

fn non_empty(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Fill the gaps of an extracted plan. `name` and `description` are kept
/// verbatim.
fn normalize(extracted: ExtractedPlan, intent: &UserIntent) -> ApplicationPlan {
    let fallback = heuristic_plan(intent);

    let plan_type = extracted
        .plan_type
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| intent.app_type_or_default().display_name().to_string());

    let mut features = non_empty(extracted.features);
    if features.is_empty() {
        features = fallback.features;
    }
    let mut technologies = non_empty(extracted.technologies);
    if technologies.is_empty() {
        technologies = fallback.technologies;
    }

    let (title, preview_description, sections) = match extracted.preview {
        Some(p) => (p.title, p.description, non_empty(p.sections)),
        None => (None, None, Vec::new()),
    };
    let sections = if sections.is_empty() {
        fallback.preview.sections
    } else {
        sections
    };

    ApplicationPlan {
        preview: PlanPreview {
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| extracted.name.clone()),
            description: preview_description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| extracted.description.clone()),
            sections,
        },
        name: extracted.name,
        description: extracted.description,
        plan_type,
        features,
        technologies,
    }
}

/// Plan from backend content, or the heuristic plan, plus its source.
pub fn synthesize_plan_with_source(
    raw: Option<&str>,
    intent: &UserIntent,
) -> (ApplicationPlan, PlanSource) {
    match extract_plan(raw) {
        Ok(extracted) => (normalize(extracted, intent), PlanSource::Backend),
        Err(reason) => {
            debug!("Using heuristic plan: {}", reason);
            (heuristic_plan(intent), PlanSource::Heuristic)
        }
    }
}

/// Plan from backend content, or the heuristic plan. Never fails.
pub fn synthesize_plan(raw: Option<&str>, intent: &UserIntent) -> ApplicationPlan {
    synthesize_plan_with_source(raw, intent).0
}
