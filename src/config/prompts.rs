//! Prompt templates for LiSearch.
//!
//! The system prompt can be replaced by a file and parameterized with
//! `{{variable}}` placeholders from the config.

use super::settings::PromptSettings;
use std::collections::HashMap;
use std::path::PathBuf;

/// Built-in system prompt for the store assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant for {{store_name}}'s point-of-sale and inventory management system.

You help store staff and managers by answering questions about:
- Product sales and performance
- Inventory levels and reordering needs
- Product information and recommendations
- Sales trends and analytics

When users ask questions, use the available tools to query the database and provide accurate, data-driven answers.

Always be:
- Concise and professional
- Data-driven (use actual numbers from queries)
- Helpful in suggesting follow-up actions
- Clear about what time period your data covers

If you need to search for a product, use the search_products_by_description tool with relevant keywords from the user's question."#;

/// Prompt templates used by the assistant.
#[derive(Debug, Clone)]
pub struct Prompts {
    /// System prompt template.
    pub system: String,
    /// Variables available in all prompts.
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        let mut variables = HashMap::new();
        variables.insert("store_name".to_string(), "a liquor store".to_string());
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            variables,
        }
    }
}

impl Prompts {
    /// Load prompts, applying a custom system prompt file and variables if configured.
    pub fn load(settings: &PromptSettings) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        for (key, value) in &settings.variables {
            prompts.variables.insert(key.clone(), value.clone());
        }

        if let Some(file) = &settings.system_prompt_file {
            let path = PathBuf::from(shellexpand::tilde(file).to_string());
            prompts.system = std::fs::read_to_string(&path)?;
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// The system prompt with all variables substituted.
    pub fn system_prompt(&self) -> String {
        Self::render(&self.system, &self.variables)
    }
}
