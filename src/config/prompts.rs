//! Prompt templates for Paddock.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use crate::language::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Per-language prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    /// English system prompt.
    pub system_en: String,
    /// Hindi system prompt.
    pub system_hi: String,
    /// English answer template with `{{context}}` and `{{question}}`.
    pub template_en: String,
    /// Hindi answer template with `{{context}}` and `{{question}}`.
    pub template_hi: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system_en: "You are an expert Formula 1 assistant. Provide accurate, comprehensive answers about F1 using the given context. \
Be factual, cite specific information from the context, and maintain an enthusiastic but professional tone."
                .to_string(),

            system_hi: "आप एक फॉर्मूला 1 विशेषज्ञ सहायक हैं। दिए गए संदर्भ का उपयोग करके F1 के बारे में सटीक, विस्तृत उत्तर प्रदान करें। \
तथ्यपरक रहें, संदर्भ से विशिष्ट जानकारी का हवाला दें, और उत्साही लेकिन पेशेवर टोन बनाए रखें।"
                .to_string(),

            template_en: r#"You are a Formula 1 expert assistant. Provide SHORT, direct answers (2-3 sentences maximum).

Context: {{context}}
Question: {{question}}

Instructions:
- Give BRIEF, factual answers only
- Use bullet points for multiple items
- Start with the direct answer, then add 1-2 supporting details if needed
- Keep responses under 100 words
- Be precise and to the point

Answer:"#
                .to_string(),

            template_hi: r#"आप एक फॉर्मूला 1 विशेषज्ञ सहायक हैं। संक्षिप्त, सीधे उत्तर दें (अधिकतम 2-3 वाक्य)।

संदर्भ: {{context}}
प्रश्न: {{question}}

निर्देश:
- केवल संक्षिप्त, तथ्यपरक उत्तर दें
- कई बिंदुओं के लिए बुलेट पॉइंट का उपयोग करें
- पहले सीधा उत्तर दें, फिर 1-2 सहायक विवरण जोड़ें
- उत्तर 100 शब्दों से कम रखें
- सटीक और मुद्दे पर रहें

उत्तर:"#
                .to_string(),
        }
    }
}

impl RagPrompts {
    /// Answer template for a language.
    pub fn template(&self, language: Language) -> &str {
        match language {
            Language::English => &self.template_en,
            Language::Hindi => &self.template_hi,
        }
    }

    /// System prompt for a language.
    pub fn system(&self, language: Language) -> &str {
        match language {
            Language::English => &self.system_en,
            Language::Hindi => &self.system_hi,
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
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
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
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
    fn test_default_templates_have_placeholders() {
        let prompts = Prompts::default();
        for lang in [Language::English, Language::Hindi] {
            let template = prompts.rag.template(lang);
            assert!(template.contains("{{context}}"));
            assert!(template.contains("{{question}}"));
            assert!(!prompts.rag.system(lang).is_empty());
        }
        assert!(prompts.rag.template(Language::Hindi).contains("संदर्भ"));
    }

    #[test]
    fn test_render_template() {
        let template = "Context: {{context}}\nQuestion: {{question}}";
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "Verstappen won in 2023.".to_string());
        vars.insert("question".to_string(), "Who won?".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Context: Verstappen won in 2023.\nQuestion: Who won?");
    }

    #[test]
    fn test_custom_variables_are_overridden_by_call_vars() {
        let mut custom = HashMap::new();
        custom.insert("team".to_string(), "Ferrari".to_string());
        custom.insert("question".to_string(), "ignored".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "Who drives for {{team}}?".to_string());
        let rendered = prompts.render_with_custom("{{question}} / {{team}}", &vars);
        assert!(rendered.ends_with("/ Ferrari"));
        assert!(!rendered.contains("ignored"));
    }

    #[test]
    fn test_load_custom_rag_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "template_en = \"Q: {{question}} C: {{context}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.rag.template_en, "Q: {{question}} C: {{context}}");
        // Untouched fields keep their defaults
        assert!(prompts.rag.template_hi.contains("प्रश्न"));
    }
}
