//! Extraction debugging command

use anyhow::Result;
use subly_core::{Rules, Verdict};

pub fn cmd_extract(rules: &Rules, descriptions: &[String]) -> Result<()> {
    for description in descriptions {
        println!("{}", describe(rules, description));
    }
    Ok(())
}

/// One line explaining what the rule table made of a description
pub fn describe(rules: &Rules, description: &str) -> String {
    let explanation = rules.extractor.explain(description);
    let rule = explanation.rule.unwrap_or("none");

    match &explanation.verdict {
        Verdict::Name(name) => format!(
            "✅ {:?} → {} [{}] (rule: {})",
            description,
            name,
            rules.classifier.classify(name),
            rule
        ),
        Verdict::Reject(reason) => {
            format!("❌ {:?} → not a subscription: {} (rule: {})", description, reason, rule)
        }
        Verdict::Pass => format!("❌ {:?} → no rule named a service", description),
    }
}
