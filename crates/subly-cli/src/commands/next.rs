//! Next payment projection command

use anyhow::Result;
use subly_core::{project, project_from_today, BillingCycle};

use super::parse_day;

pub fn cmd_next(start: &str, cycle: &str, today: Option<&str>) -> Result<()> {
    let start = parse_day(start)?;
    let cycle: BillingCycle = cycle.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    let next = match today {
        Some(today) => project(start, cycle, parse_day(today)?),
        None => project_from_today(start, cycle),
    };
    println!("📅 Next {} payment: {}", cycle.as_str().to_lowercase(), next);
    Ok(())
}
