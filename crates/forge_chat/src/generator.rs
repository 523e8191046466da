//! Built-in file generator and output writer.
//!
//! [`TemplateFileGenerator`] renders a small static web app from the plan
//! description handed over by the approval gate. Templates use
//! `{{variable}}` placeholders.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, info};

use crate::error::GenerationError;
use crate::gate::{FileGenerator, GeneratedFile, GenerationOutput, GenerationRequest};

const DEFAULT_APP_NAME: &str = "My App";

static VARIABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([a-zA-Z_][a-zA-Z0-9_]*)\}\}").expect("placeholder pattern is valid")
});

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{{app_name}}</title>
  <link rel="stylesheet" href="styles.css">
</head>
<body>
  <header class="hero">
    <h1>{{app_name}}</h1>
    <p>{{summary}}</p>
  </header>
  <main>
    <section id="features">
      <h2>Features</h2>
      <ul>
{{feature_items}}
      </ul>
    </section>
    <section id="app"></section>
  </main>
  <script src="app.js"></script>
</body>
</html>
"#;

const STYLES_CSS: &str = r#"* {
  box-sizing: border-box;
}

body {
  margin: 0;
  font-family: system-ui, -apple-system, sans-serif;
  color: #1f2933;
  background: #f7f9fc;
}

.hero {
  padding: 4rem 2rem;
  text-align: center;
  background: linear-gradient(135deg, #4f46e5, #06b6d4);
  color: #fff;
}

main {
  max-width: 960px;
  margin: 0 auto;
  padding: 2rem;
}

#features li {
  padding: 0.5rem 0;
}

@media (max-width: 600px) {
  .hero {
    padding: 2rem 1rem;
  }
}
"#;

const APP_JS: &str = r#"const APP_NAME = "{{app_name_js}}";

document.addEventListener("DOMContentLoaded", () => {
  const root = document.getElementById("app");
  const greeting = document.createElement("p");
  greeting.textContent = `Welcome to ${APP_NAME}.`;
  root.appendChild(greeting);
});
"#;

const PACKAGE_JSON: &str = r#"{
  "name": "{{package_name}}",
  "version": "0.1.0",
  "private": true,
  "description": "{{summary_json}}",
  "scripts": {
    "start": "npx serve ."
  }
}
"#;

const README_MD: &str = r#"# {{app_name}}

{{summary}}

## Features

{{feature_list}}

## Getting started

```bash
npm start
```
"#;

/// `(path, language, template)` for every generated file.
const FILES: &[(&str, &str, &str)] = &[
    ("index.html", "html", INDEX_HTML),
    ("styles.css", "css", STYLES_CSS),
    ("app.js", "javascript", APP_JS),
    ("package.json", "json", PACKAGE_JSON),
    ("README.md", "markdown", README_MD),
];

/// Generates a static web app skeleton without calling out anywhere.
#[derive(Debug, Clone, Default)]
pub struct TemplateFileGenerator;

impl TemplateFileGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Render all files for a description.
    pub fn render(&self, description: &str) -> Result<GenerationOutput, GenerationError> {
        if description.trim().is_empty() {
            return Err(GenerationError::Failed("empty build description".into()));
        }
        let vars = build_variable_map(description);

        let files = FILES
            .iter()
            .map(|(path, language, template)| {
                debug!("Rendered: {}", path);
                GeneratedFile {
                    name: file_name(path),
                    path: path.to_string(),
                    content: render_content(template, &vars),
                    language: language.to_string(),
                }
            })
            .collect();

        Ok(GenerationOutput { files })
    }
}

#[async_trait]
impl FileGenerator for TemplateFileGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError> {
        self.render(&request.description)
    }
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn build_variable_map(description: &str) -> HashMap<&'static str, String> {
    let first_line = description.lines().next().unwrap_or_default().trim();
    let (name, summary) = match first_line.split_once(": ") {
        Some((name, summary)) if !name.trim().is_empty() => (name.trim(), summary.trim()),
        _ => (DEFAULT_APP_NAME, first_line),
    };

    let features: Vec<&str> = description
        .lines()
        .filter_map(|l| l.trim().strip_prefix("- "))
        .collect();

    let feature_items = features
        .iter()
        .map(|f| format!("        <li>{}</li>", escape_html(f)))
        .collect::<Vec<_>>()
        .join("\n");
    let feature_list = features
        .iter()
        .map(|f| format!("- {}", f))
        .collect::<Vec<_>>()
        .join("\n");

    let mut vars = HashMap::new();
    vars.insert("app_name", escape_html(name));
    vars.insert("app_name_js", escape_js(name));
    vars.insert("summary", escape_html(summary));
    vars.insert("summary_json", escape_js(summary));
    vars.insert("package_name", to_package_name(name));
    vars.insert("feature_items", feature_items);
    vars.insert("feature_list", feature_list);
    vars
}

/// Replace `{{key}}` placeholders in one pass. Substituted values are not
/// rescanned; unknown keys are left as written.
fn render_content(template: &str, vars: &HashMap<&'static str, String>) -> String {
    VARIABLE_PATTERN
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            vars.get(key)
                .cloned()
                .unwrap_or_else(|| format!("{{{{{}}}}}", key))
        })
        .into_owned()
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Escape for a double-quoted JS or JSON string.
fn escape_js(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

/// npm-style package name: lowercase, kebab-case.
fn to_package_name(name: &str) -> String {
    let mut out = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    let trimmed = out.trim_end_matches('-');
    if trimmed.is_empty() {
        "app".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Reject absolute paths and parent-directory traversal.
fn safe_relative_path(path: &str) -> Result<PathBuf, GenerationError> {
    let candidate = Path::new(path);
    let mut out = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => return Err(GenerationError::UnsafePath(path.to_string())),
        }
    }
    if out.as_os_str().is_empty() {
        return Err(GenerationError::UnsafePath(path.to_string()));
    }
    Ok(out)
}

/// Write generated files below `root`, creating directories as needed.
///
/// Every path is checked before anything is written.
pub fn write_files(root: &Path, output: &GenerationOutput) -> Result<Vec<PathBuf>, GenerationError> {
    let targets = output
        .files
        .iter()
        .map(|f| safe_relative_path(&f.path).map(|rel| (root.join(rel), f)))
        .collect::<Result<Vec<_>, _>>()?;

    fs::create_dir_all(root)?;
    info!("Writing {} files to {:?}", targets.len(), root);

    let mut written = Vec::with_capacity(targets.len());
    for (target, file) in targets {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &file.content)?;
        debug!("Wrote: {:?}", target);
        written.push(target);
    }
    Ok(written)
}
