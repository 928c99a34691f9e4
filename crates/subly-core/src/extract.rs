//! Service name extraction from free-text bank descriptions
//!
//! Extraction is an ordered table of rules. Each rule looks at the description
//! and either passes, rejects it outright, or names the service. The first rule
//! that does not pass decides:
//!
//! 1. Whitelist: reject unless a known service keyword appears
//! 2. Generic verb: reject operational banking verbs ("nákup ...", "převod ...")
//! 3. Template: pull the merchant out of marketing suffixes ("X Premium")
//! 4. Lookup: map the keyword to its canonical name
//! 5. Leading words: title-case the first meaningful words

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};
use crate::rules::{lowercase_all, ExtractionConfig};

/// What a single rule made of a description
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No opinion, try the next rule
    Pass,
    /// Not a subscription; the reason is for diagnostics only
    Reject(String),
    Name(String),
}

#[derive(Debug, Clone)]
pub enum ExtractionRule {
    Whitelist { keywords: Vec<String> },
    GenericVerb { patterns: Vec<Regex> },
    Template { patterns: Vec<Regex> },
    Lookup { services: Vec<(String, String)> },
    LeadingWords { stopwords: Vec<String> },
}

impl ExtractionRule {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Whitelist { .. } => "whitelist",
            Self::GenericVerb { .. } => "generic-verb",
            Self::Template { .. } => "template",
            Self::Lookup { .. } => "lookup",
            Self::LeadingWords { .. } => "leading-words",
        }
    }

    /// Apply the rule. `lowered` is `description.to_lowercase()`.
    pub fn apply(&self, description: &str, lowered: &str) -> Verdict {
        match self {
            Self::Whitelist { keywords } => {
                if keywords.iter().any(|k| lowered.contains(k.as_str())) {
                    Verdict::Pass
                } else {
                    Verdict::Reject("no known service keyword".into())
                }
            }
            Self::GenericVerb { patterns } => match patterns.iter().find(|p| p.is_match(lowered)) {
                Some(p) => Verdict::Reject(format!("generic transaction ({})", p.as_str())),
                None => Verdict::Pass,
            },
            Self::Template { patterns } => {
                for pattern in patterns {
                    let Some(captured) = pattern.captures(description).and_then(|c| c.get(1))
                    else {
                        continue;
                    };
                    let name = collapse_whitespace(captured.as_str());
                    if !name.is_empty() {
                        return Verdict::Name(title_case(&name));
                    }
                }
                Verdict::Pass
            }
            Self::Lookup { services } => services
                .iter()
                .find(|(keyword, _)| lowered.contains(keyword.as_str()))
                .map(|(_, name)| Verdict::Name(name.clone()))
                .unwrap_or(Verdict::Pass),
            Self::LeadingWords { stopwords } => leading_words(description, stopwords),
        }
    }
}

/// Which rule decided, and what it decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// None when every rule passed
    pub rule: Option<&'static str>,
    pub verdict: Verdict,
}

impl Explanation {
    pub fn name(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Name(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Maps a bank description to a canonical service name
#[derive(Debug, Clone)]
pub struct ServiceNameExtractor {
    rules: Vec<ExtractionRule>,
}

impl ServiceNameExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let services: Vec<(String, String)> = config
            .services
            .iter()
            .map(|(keyword, name)| (keyword.to_lowercase(), name.clone()))
            .collect();
        let keywords = services.iter().map(|(k, _)| k.clone()).collect();

        Ok(Self::from_rules(vec![
            ExtractionRule::Whitelist { keywords },
            ExtractionRule::GenericVerb {
                patterns: compile_all(&config.generic_prefixes)?,
            },
            ExtractionRule::Template {
                patterns: compile_all(&config.templates)?,
            },
            ExtractionRule::Lookup { services },
            ExtractionRule::LeadingWords {
                stopwords: lowercase_all(config.fallback_stopwords.clone()),
            },
        ]))
    }

    /// Build an extractor from an explicit rule table
    pub fn from_rules(rules: Vec<ExtractionRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    /// Number of whitelisted service keywords
    pub fn keyword_count(&self) -> usize {
        self.rules
            .iter()
            .find_map(|r| match r {
                ExtractionRule::Whitelist { keywords } => Some(keywords.len()),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Canonical service name for a description, or None if it is not a
    /// subscription payment
    pub fn extract(&self, description: &str) -> Option<String> {
        match self.explain(description).verdict {
            Verdict::Name(name) => Some(name),
            _ => None,
        }
    }

    /// Run the rule table and report which rule decided
    pub fn explain(&self, description: &str) -> Explanation {
        let description = description.trim();
        let lowered = description.to_lowercase();

        for rule in &self.rules {
            match rule.apply(description, &lowered) {
                Verdict::Pass => continue,
                verdict => {
                    return Explanation {
                        rule: Some(rule.name()),
                        verdict,
                    }
                }
            }
        }

        Explanation {
            rule: None,
            verdict: Verdict::Pass,
        }
    }
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            RegexBuilder::new(p)
                .case_insensitive(true)
                .build()
                .map_err(Error::from)
        })
        .collect()
}

/// First two alphabetic words longer than two letters among the first three
fn leading_words(description: &str, stopwords: &[String]) -> Verdict {
    let words: Vec<&str> = description.split_whitespace().collect();
    if words.len() < 2 {
        return Verdict::Pass;
    }

    let picked: Vec<&str> = words
        .iter()
        .take(3)
        .filter(|w| w.chars().all(char::is_alphabetic) && w.chars().count() > 2)
        .take(2)
        .copied()
        .collect();

    if picked.is_empty() {
        return Verdict::Pass;
    }

    let candidate = title_case(&picked.join(" "));
    let lowered = candidate.to_lowercase();
    if stopwords.iter().any(|s| lowered.contains(s.as_str())) {
        return Verdict::Reject(format!("generic phrase ({})", candidate));
    }
    Verdict::Name(candidate)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalize the first letter of every run of letters, lowercase the rest.
/// "T-MOBILE CZ" becomes "T-Mobile Cz".
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
