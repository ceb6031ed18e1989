use std::path::Path;

use crate::paths;

pub const MODELS_FILE_NAME: &str = "models.conf";

pub const FALLBACK_MODELS: [&str; 3] = ["llama3:latest", "mistral:latest", "tinyllama:latest"];

/// Models offered for new nodes. Never empty; the first entry is the default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelList {
    models: Vec<String>,
}

impl Default for ModelList {
    fn default() -> Self {
        Self {
            models: FALLBACK_MODELS.iter().map(|model| model.to_string()).collect(),
        }
    }
}

impl ModelList {
    /// ./models.conf, then ~/.chat-canvas/models.conf, then the built-in list.
    pub fn load() -> Self {
        for path in [Path::new(MODELS_FILE_NAME).to_path_buf(), paths::models_conf_path()] {
            if let Some(list) = Self::from_file(&path) {
                return list;
            }
        }
        log::info!("{} not found. Using default models.", MODELS_FILE_NAME);
        Self::default()
    }

    /// One model per line; blank lines are skipped. `None` when the file is missing or lists
    /// nothing.
    pub fn from_file(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let list = Self::parse(&content);
        if list.is_none() {
            log::warn!("{} lists no models", path.display());
        }
        list
    }

    pub fn parse(content: &str) -> Option<Self> {
        let models: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if models.is_empty() {
            None
        } else {
            Some(Self { models })
        }
    }

    pub fn default_model(&self) -> &str {
        &self.models[0]
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|entry| entry == model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_blank_lines_and_trims() {
        let list = ModelList::parse("\n  qwen2:7b \n\nclaude-3-5-sonnet-latest\n").unwrap();
        assert_eq!(list.models(), &["qwen2:7b".to_string(), "claude-3-5-sonnet-latest".to_string()]);
        assert_eq!(list.default_model(), "qwen2:7b");
    }

    #[test]
    fn empty_file_lists_nothing() {
        assert!(ModelList::parse(" \n\n").is_none());
    }

    #[test]
    fn fallback_starts_with_llama3() {
        let list = ModelList::default();
        assert_eq!(list.default_model(), "llama3:latest");
        assert!(list.contains("tinyllama:latest"));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ModelList::from_file(&dir.path().join(MODELS_FILE_NAME)).is_none());
    }
}
