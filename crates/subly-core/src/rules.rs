//! Detection rules configuration
//!
//! All keyword lists, name templates and thresholds used by the pipeline are
//! data, not code. They live in `config/rules.toml`.
//!
//! ## Configuration Resolution
//!
//! 1. An explicit path (CLI `--rules`), which must exist
//! 2. Override in data dir (~/.local/share/subly/config/rules.toml)
//! 3. Embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::categorize::CategoryClassifier;
use crate::error::Result;
use crate::extract::ServiceNameExtractor;

/// Embedded default rules (compiled into binary)
const DEFAULT_RULES: &str = include_str!("../../../config/rules.toml");

/// `[extraction]` section
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Ordered (keyword, canonical name) pairs; keywords double as the whitelist
    pub services: Vec<(String, String)>,
    /// Regexes for generic banking verbs, matched against the lowercased text
    pub generic_prefixes: Vec<String>,
    /// Regexes whose first capture group is the merchant name
    pub templates: Vec<String>,
    #[serde(default)]
    pub fallback_stopwords: Vec<String>,
}

/// `[grouping]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    pub min_transactions: usize,
    /// Services accepted on a single transaction
    pub single_transaction_services: Vec<String>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            min_transactions: 2,
            single_transaction_services: Vec::new(),
        }
    }
}

/// `[cadence]` section, inclusive day bounds on the average payment gap
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub monthly_days: (f64, f64),
    pub yearly_days: (f64, f64),
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            monthly_days: (25.0, 35.0),
            yearly_days: (350.0, 380.0),
        }
    }
}

/// `[categories]` section. Sets are tested in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub entertainment: Vec<String>,
    pub music: Vec<String>,
    pub storage: Vec<String>,
    pub ai: Vec<String>,
    pub productivity: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RulesFile {
    extraction: ExtractionConfig,
    #[serde(default)]
    grouping: GroupingConfig,
    #[serde(default)]
    cadence: CadenceConfig,
    #[serde(default)]
    categories: CategoryConfig,
}

/// Where a rules set was loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesSource {
    Embedded,
    File(PathBuf),
}

impl std::fmt::Display for RulesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => write!(f, "built-in defaults"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Compiled rules, immutable once built
#[derive(Debug, Clone)]
pub struct Rules {
    pub extractor: ServiceNameExtractor,
    pub classifier: CategoryClassifier,
    pub grouping: GroupingConfig,
    pub cadence: CadenceConfig,
    source: RulesSource,
}

impl Rules {
    /// Rules compiled from the embedded defaults
    pub fn embedded() -> Result<Self> {
        Self::from_toml(DEFAULT_RULES)
    }

    /// Parse and compile a rules document
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: RulesFile = toml::from_str(content)?;
        let mut grouping = file.grouping;
        grouping.single_transaction_services = lowercase_all(grouping.single_transaction_services);

        Ok(Self {
            extractor: ServiceNameExtractor::new(&file.extraction)?,
            classifier: CategoryClassifier::new(&file.categories),
            grouping,
            cadence: file.cadence,
            source: RulesSource::Embedded,
        })
    }

    /// Load rules from a file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut rules = Self::from_toml(&content)?;
        rules.source = RulesSource::File(path.to_path_buf());
        Ok(rules)
    }

    /// Resolve rules: explicit path, then data-dir override, then embedded
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }

        if let Some(path) = default_rules_path() {
            if path.exists() {
                debug!("Loading rules override from {}", path.display());
                return Self::from_path(&path);
            }
        }

        Self::embedded()
    }

    pub fn source(&self) -> &RulesSource {
        &self.source
    }

    /// Whether a service may be accepted on a single transaction
    pub fn accepts_single(&self, service_name: &str) -> bool {
        let name = service_name.to_lowercase();
        self.grouping
            .single_transaction_services
            .iter()
            .any(|known| name.contains(known.as_str()))
    }
}

/// Default rules override path
pub fn default_rules_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("subly").join("config").join("rules.toml"))
}

/// The embedded rules document, for `subly rules --dump`
pub fn default_rules_toml() -> &'static str {
    DEFAULT_RULES
}

pub(crate) fn lowercase_all(words: Vec<String>) -> Vec<String> {
    words.into_iter().map(|w| w.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_embedded_rules_compile() {
        let rules = Rules::embedded().unwrap();
        assert_eq!(rules.source(), &RulesSource::Embedded);
        assert_eq!(rules.grouping.min_transactions, 2);
        assert_eq!(rules.cadence.monthly_days, (25.0, 35.0));
        assert_eq!(rules.cadence.yearly_days, (350.0, 380.0));
        assert!(rules.extractor.keyword_count() >= 35);
    }

    #[test]
    fn test_accepts_single() {
        let rules = Rules::embedded().unwrap();
        assert!(rules.accepts_single("T-Mobile"));
        assert!(rules.accepts_single("Netflix"));
        assert!(rules.accepts_single("Apple Services"));
        assert!(!rules.accepts_single("Tidal"));
        assert!(!rules.accepts_single("Strava Premium"));
    }

    #[test]
    fn test_minimal_document_uses_section_defaults() {
        let doc = r#"
[extraction]
services = [["tidal", "Tidal"]]
generic_prefixes = []
templates = []
"#;
        let rules = Rules::from_toml(doc).unwrap();
        assert_eq!(rules.grouping.min_transactions, 2);
        assert!(rules.grouping.single_transaction_services.is_empty());
        assert_eq!(rules.cadence.yearly_days, (350.0, 380.0));
        assert_eq!(rules.extractor.extract("TIDAL.COM"), Some("Tidal".to_string()));
    }

    #[test]
    fn test_invalid_template_is_a_regex_error() {
        let doc = r#"
[extraction]
services = [["tidal", "Tidal"]]
generic_prefixes = []
templates = ['(unclosed']
"#;
        assert!(matches!(Rules::from_toml(doc), Err(Error::Regex(_))));
    }

    #[test]
    fn test_malformed_document_is_a_config_error() {
        assert!(matches!(
            Rules::from_toml("[extraction"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(&path, default_rules_toml()).unwrap();

        let rules = Rules::load(Some(&path)).unwrap();
        assert_eq!(rules.source(), &RulesSource::File(path.clone()));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(Rules::load(Some(&missing)), Err(Error::Io(_))));
    }
}
