//! Prompt templates for Pantry.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful food expert. Use the provided context to answer questions \
                     about food accurately and informatively. Include cultural context and \
                     interesting details when relevant."
                .to_string(),

            user: r#"Use the following context to answer the question about food.

Context:
{{context}}

Question: {{question}}
Answer:"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Single left-to-right pass: substituted values are copied verbatim and
    /// never scanned again. Unknown placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let value = after
                .find("}}")
                .and_then(|end| vars.get(&after[..end]).map(|value| (end, value)));
            match value {
                Some((end, value)) => {
                    result.push_str(value);
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str("{{");
                    rest = after;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.system.contains("food expert"));
        assert!(prompts.rag.user.ends_with("Answer:"));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_substituted_values_are_not_rendered_again() {
        let template = "Context:\n{{context}}\n\nQuestion: {{question}}";
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "Ask me about {{question}}".to_string());
        vars.insert("question".to_string(), "What is {{context}}?".to_string());

        for _ in 0..50 {
            assert_eq!(
                Prompts::render(template, &vars),
                "Context:\nAsk me about {{question}}\n\nQuestion: What is {{context}}?"
            );
        }
    }

    #[test]
    fn test_unknown_and_unclosed_placeholders_are_kept() {
        let mut vars = HashMap::new();
        vars.insert("dish".to_string(), "paella".to_string());

        assert_eq!(
            Prompts::render("{{cuisine}} and {{dish}}", &vars),
            "{{cuisine}} and paella"
        );
        assert_eq!(Prompts::render("{{ {{dish}}", &vars), "{{ paella");
        assert_eq!(Prompts::render("{{dish", &vars), "{{dish");
    }

    #[test]
    fn test_provided_vars_override_custom() {
        let mut custom = HashMap::new();
        custom.insert("cuisine".to_string(), "Thai".to_string());
        custom.insert("question".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "What is Pad Thai?".to_string());

        let rendered = prompts.render_with_custom("{{cuisine}}: {{question}}", &vars);
        assert_eq!(rendered, "Thai: What is Pad Thai?");
    }

    #[test]
    fn test_custom_dir_overrides_rag_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "system = \"You are a pastry chef.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.system, "You are a pastry chef.");
        // Fields missing from the file keep their defaults.
        assert!(prompts.rag.user.contains("{{context}}"));
    }
}
