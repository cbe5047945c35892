//! Prompt templates, loaded once at startup and read-only thereafter.

use std::collections::HashMap;
use std::path::Path;

/// System prompt templates keyed by prompt id. A missing or corrupt file
/// yields an empty library; callers then compose against an empty base.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    prompts: HashMap<String, String>,
}

impl PromptLibrary {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let prompts = std::fs::read_to_string(path.as_ref())
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();
        Self { prompts }
    }

    pub fn from_map(prompts: HashMap<String, String>) -> Self {
        Self { prompts }
    }

    /// The template for this id, falling back to "default", then to "".
    pub fn resolve(&self, prompt_id: Option<&str>) -> &str {
        prompt_id
            .and_then(|id| self.prompts.get(id))
            .or_else(|| self.prompts.get("default"))
            .map(String::as_str)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_id_falls_back_to_default_then_empty() {
        let mut map = HashMap::new();
        map.insert("default".to_string(), "base prompt".to_string());
        map.insert("mx".to_string(), "maintenance prompt".to_string());
        let library = PromptLibrary::from_map(map);

        assert_eq!(library.resolve(Some("mx")), "maintenance prompt");
        assert_eq!(library.resolve(Some("nope")), "base prompt");
        assert_eq!(library.resolve(None), "base prompt");
        assert_eq!(PromptLibrary::default().resolve(Some("mx")), "");
    }

    #[test]
    fn missing_file_yields_empty_library() {
        let library = PromptLibrary::load("/definitely/not/a/file.json");
        assert_eq!(library.resolve(None), "");
    }
}
