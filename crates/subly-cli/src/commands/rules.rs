//! Rules inspection commands

use anyhow::Result;
use subly_core::{default_rules_path, default_rules_toml, Rules};

pub fn cmd_rules_show(rules: &Rules) -> Result<()> {
    println!();
    println!("📐 Detection Rules");
    println!("   Source: {}", rules.source());
    println!(
        "   Extraction order: {}",
        rules
            .extractor
            .rules()
            .iter()
            .map(|r| r.name())
            .collect::<Vec<_>>()
            .join(" → ")
    );
    println!("   Service keywords: {}", rules.extractor.keyword_count());
    println!(
        "   Minimum payments: {} ({} services accepted on one)",
        rules.grouping.min_transactions,
        rules.grouping.single_transaction_services.len()
    );
    println!(
        "   Monthly window: {}-{} days, yearly window: {}-{} days",
        rules.cadence.monthly_days.0,
        rules.cadence.monthly_days.1,
        rules.cadence.yearly_days.0,
        rules.cadence.yearly_days.1
    );
    Ok(())
}

pub fn cmd_rules_path() -> Result<()> {
    match default_rules_path() {
        Some(path) => {
            let state = if path.exists() { "present" } else { "not present" };
            println!("{} ({})", path.display(), state);
        }
        None => println!("No data directory on this platform; using built-in rules"),
    }
    Ok(())
}

pub fn cmd_rules_dump() -> Result<()> {
    print!("{}", default_rules_toml());
    Ok(())
}
