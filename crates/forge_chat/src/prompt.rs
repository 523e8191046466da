//! Prompt assembly.
//!
//! Pure string construction: the same request, context and intent always
//! produce the same [`PromptPair`].

use std::fmt::Write;

use forge_intent::{IntentType, UserIntent};
use forge_project::ProjectContext;

use crate::config::PromptLimits;
use crate::types::{AssistRequest, PromptPair};

/// Appended to a file excerpt that was cut short.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

const SYSTEM_PREAMBLE: &str = "You are AppForge, an expert software engineer who helps users \
design, build, debug and understand web applications.

When asked to create an application, answer with a single JSON object of this shape:
{\"name\": string, \"description\": string, \"type\": string, \"features\": [string], \
\"technologies\": [string], \"preview\": {\"title\": string, \"description\": string, \"sections\": [string]}}

For every other request, answer in concise Markdown and include code blocks where useful.";

/// Builds prompts within configured limits.
#[derive(Debug, Clone, Default)]
pub struct PromptAssembler {
    limits: PromptLimits,
}

impl PromptAssembler {
    pub fn new(limits: PromptLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> PromptLimits {
        self.limits
    }

    pub fn build_prompts(
        &self,
        request: &AssistRequest,
        context: Option<&ProjectContext>,
        intent: Option<&UserIntent>,
    ) -> PromptPair {
        PromptPair {
            system_prompt: self.system_prompt(context, intent),
            user_prompt: self.user_prompt(request, context, intent),
        }
    }

    fn system_prompt(&self, context: Option<&ProjectContext>, intent: Option<&UserIntent>) -> String {
        let mut out = String::from(SYSTEM_PREAMBLE);

        if let Some(intent) = intent {
            let features: Vec<&str> = intent.features.iter().map(|f| f.as_str()).collect();
            out.push_str("\n\n## Request analysis\n");
            let _ = writeln!(out, "- Intent: {}", intent.intent_type);
            let _ = writeln!(out, "- App type: {}", intent.app_type_or_default());
            let _ = writeln!(out, "- Domain: {}", intent.domain);
            let _ = writeln!(out, "- Complexity: {}", intent.complexity);
            let _ = writeln!(out, "- Features: {}", list_or_none(features.as_slice()));
            let _ = write!(out, "- Technologies: {}", list_or_none(intent.technologies.as_slice()));
        }

        if let Some(context) = context {
            out.push_str("\n\n## Project context\n");
            let _ = writeln!(out, "- Project: {}", context.project.name);
            let _ = writeln!(out, "- Files: {}", context.file_count());
            let _ = write!(out, "- Dependencies: {}", list_or_none(context.dependencies.as_slice()));
            if !context.issues.is_empty() {
                out.push_str("\n- Detected issues:");
                for issue in &context.issues {
                    let _ = write!(out, "\n  - {}", issue.message);
                }
            }
        }

        out
    }

    fn user_prompt(
        &self,
        request: &AssistRequest,
        context: Option<&ProjectContext>,
        intent: Option<&UserIntent>,
    ) -> String {
        let mut out = request.message.clone();

        if let Some(code) = request.code.as_deref() {
            let language = request.language.as_deref().unwrap_or_default();
            let _ = write!(out, "\n\n```{}\n{}\n```", language, code);
        }

        if let Some(context) = context {
            let excerpts = context
                .leaf_files()
                .filter_map(|f| f.content.as_deref().map(|c| (f, c)))
                .filter(|(_, content)| !content.trim().is_empty())
                .take(self.limits.max_context_files);

            for (file, content) in excerpts {
                let language = file.extension().unwrap_or_default();
                let _ = write!(
                    out,
                    "\n\nFile: {}\n```{}\n{}\n```",
                    file.path,
                    language,
                    truncate_chars(content, self.limits.file_excerpt_chars)
                );
            }
        }

        if let Some(intent) = intent {
            out.push_str("\n\n");
            out.push_str(instruction_for(intent.intent_type));
        }

        out
    }
}

/// Build prompts with default limits.
pub fn build_prompts(
    request: &AssistRequest,
    context: Option<&ProjectContext>,
    intent: Option<&UserIntent>,
) -> PromptPair {
    PromptAssembler::default().build_prompts(request, context, intent)
}

/// Closing instruction for each intent.
pub fn instruction_for(intent: IntentType) -> &'static str {
    match intent {
        IntentType::CreateApp => {
            "Propose an application plan as a single JSON object in the shape described above."
        }
        IntentType::ModifyCode => {
            "Show the modified code and briefly explain each change."
        }
        IntentType::Debug => {
            "Identify the most likely cause of the problem and show a corrected version."
        }
        IntentType::Explain => {
            "Explain what the code does step by step in plain language."
        }
        IntentType::GenerateFeature => {
            "Implement the requested feature and explain how to integrate it."
        }
    }
}

/// First `max_chars` characters, plus [`TRUNCATION_MARKER`] when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn list_or_none<S: AsRef<str>>(items: &[S]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use forge_intent::classify;
    use forge_project::{Project, ProjectFile};

    fn file(id: u64, path: &str, content: Option<&str>, is_directory: bool) -> ProjectFile {
        ProjectFile {
            id,
            project_id: 1,
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            path: path.to_string(),
            content: content.map(str::to_string),
            is_directory,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn context(files: Vec<ProjectFile>) -> ProjectContext {
        let project = Project {
            id: 1,
            name: "Storefront".into(),
            description: None,
            language: Some("javascript".into()),
            framework: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        ProjectContext::from_parts(project, files)
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abc", 5), "abc");
        assert_eq!(truncate_chars("abcdef", 3), "abc... [truncated]");
        // multi-byte characters are never split
        assert_eq!(truncate_chars("ééé", 2), "éé... [truncated]");
        assert_eq!(truncate_chars("", 0), "");
    }

    #[test]
    fn test_file_excerpts_are_capped() {
        let long = "x".repeat(5000);
        let ctx = context(vec![
            file(1, "src", None, true),
            file(2, "src/empty.js", Some("   "), false),
            file(3, "src/a.js", Some(&long), false),
            file(4, "src/b.js", Some("short"), false),
            file(5, "src/c.js", Some("never included"), false),
        ]);

        let prompts = build_prompts(&AssistRequest::new("help"), Some(&ctx), None);
        let user = &prompts.user_prompt;

        let expected = format!("{}{}", "x".repeat(800), TRUNCATION_MARKER);
        assert!(user.contains(&expected));
        assert!(!user.contains(&"x".repeat(801)));
        assert!(user.contains("File: src/b.js\n```js\nshort\n```"));
        assert!(!user.contains("never included"));
        assert!(!user.contains("src/empty.js"));
    }

    #[test]
    fn test_custom_limits() {
        let ctx = context(vec![
            file(1, "a.js", Some("aaaa"), false),
            file(2, "b.js", Some("bbbb"), false),
        ]);
        let assembler = PromptAssembler::new(PromptLimits {
            max_context_files: 1,
            file_excerpt_chars: 2,
        });
        let prompts = assembler.build_prompts(&AssistRequest::new("go"), Some(&ctx), None);
        assert!(prompts.user_prompt.contains("aa... [truncated]"));
        assert!(!prompts.user_prompt.contains("bbbb"));
    }

    #[test]
    fn test_explain_with_code() {
        let request = AssistRequest::new("Can you explain this function?")
            .with_code("function add(a, b) { return a + b; }", Some("javascript".into()));
        let intent = classify(&request.message);
        let prompts = build_prompts(&request, None, Some(&intent));

        assert!(prompts.user_prompt.starts_with("Can you explain this function?"));
        assert!(prompts
            .user_prompt
            .contains("```javascript\nfunction add(a, b) { return a + b; }\n```"));
        assert!(prompts.user_prompt.ends_with(instruction_for(IntentType::Explain)));
        assert!(prompts.system_prompt.contains("- Intent: explain"));
    }

    #[test]
    fn test_system_prompt_blocks() {
        let bare = build_prompts(&AssistRequest::new("hi"), None, None);
        assert_eq!(bare.system_prompt, SYSTEM_PREAMBLE);
        assert_eq!(bare.user_prompt, "hi");

        let ctx = context(vec![
            file(1, "package.json", Some(r#"{"dependencies":{"react":"18"}}"#), false),
            file(2, "app.js", Some("console.error('x')"), false),
        ]);
        let intent = classify("Build a todo app");
        let prompts = build_prompts(&AssistRequest::new("Build a todo app"), Some(&ctx), Some(&intent));
        let system = &prompts.system_prompt;

        assert!(system.contains("- App type: todo"));
        assert!(system.contains("- Domain: general"));
        assert!(system.contains("- Complexity: moderate"));
        assert!(system.contains("- Project: Storefront"));
        assert!(system.contains("- Files: 2"));
        assert!(system.contains("- Dependencies: react"));
        assert!(system.contains("  - app.js logs errors to the console"));
    }

    #[test]
    fn test_default_app_type_label() {
        let intent = classify("make me something nice");
        let prompts = build_prompts(&AssistRequest::new("x"), None, Some(&intent));
        assert!(prompts.system_prompt.contains("- App type: web-app"));
        assert!(prompts.system_prompt.contains("- Features: none"));
    }
}
