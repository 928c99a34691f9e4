//! Category classification for detected services

use crate::models::Category;
use crate::rules::{lowercase_all, CategoryConfig};

/// Keyword-set classifier. Sets are tested in a fixed order and the first
/// hit wins, so a name matching several sets gets the earliest category.
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    sets: Vec<(Category, Vec<String>)>,
}

impl CategoryClassifier {
    pub fn new(config: &CategoryConfig) -> Self {
        let sets = vec![
            (Category::Entertainment, lowercase_all(config.entertainment.clone())),
            (Category::Music, lowercase_all(config.music.clone())),
            (Category::Storage, lowercase_all(config.storage.clone())),
            (Category::Ai, lowercase_all(config.ai.clone())),
            (Category::Productivity, lowercase_all(config.productivity.clone())),
        ];
        Self { sets }
    }

    /// Category for a canonical service name. Total: unknown names are `Other`.
    pub fn classify(&self, service_name: &str) -> Category {
        let name = service_name.to_lowercase();
        self.sets
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| name.contains(k.as_str())))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }
}
