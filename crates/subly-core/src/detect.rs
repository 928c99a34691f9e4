//! Recurring payment detection
//!
//! Transactions are grouped by their extracted service name. A group is a
//! recurring service when it has enough payments, or when the service is known
//! to bill from the first payment. The average gap between payments decides
//! whether it bills monthly or yearly.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::extract::ServiceNameExtractor;
use crate::models::{BillingCycle, ParsedTransaction};
use crate::rules::{CadenceConfig, Rules};

/// Transactions sharing one canonical service name
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceGroup {
    pub name: String,
    pub transactions: Vec<ParsedTransaction>,
}

impl ServiceGroup {
    /// Transactions in chronological order, undated ones first.
    /// Same-day payments keep their file order.
    pub fn chronological(&self) -> Vec<&ParsedTransaction> {
        let mut sorted: Vec<_> = self.transactions.iter().collect();
        sorted.sort_by_key(|t| t.date);
        sorted
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.transactions.iter().filter_map(|t| t.date).collect()
    }

    /// Amount of the most recent payment
    pub fn latest_price(&self) -> Option<Decimal> {
        self.chronological().last().map(|t| t.amount)
    }

    /// Earliest payment date, if any payment is dated
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.transactions.iter().filter_map(|t| t.date).min()
    }
}

/// A group that passed acceptance
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedService {
    pub name: String,
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    pub start_date: Option<NaiveDate>,
}

/// Partition transactions by service name. Descriptions that do not name a
/// service are dropped. Groups come out in order of first appearance.
pub fn group_by_service(
    transactions: &[ParsedTransaction],
    extractor: &ServiceNameExtractor,
) -> Vec<ServiceGroup> {
    let mut groups: Vec<ServiceGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for tx in transactions {
        let Some(name) = extractor.extract(&tx.description) else {
            continue;
        };

        match index.get(&name) {
            Some(&i) => groups[i].transactions.push(tx.clone()),
            None => {
                index.insert(name.clone(), groups.len());
                groups.push(ServiceGroup {
                    name,
                    transactions: vec![tx.clone()],
                });
            }
        }
    }

    groups
}

/// Mean gap in days between consecutive dates, in chronological order.
/// None with fewer than two dates.
pub fn average_gap(dates: &[NaiveDate]) -> Option<f64> {
    let mut sorted = dates.to_vec();
    sorted.sort();

    let intervals: Vec<i64> = sorted
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .collect();

    if intervals.is_empty() {
        return None;
    }

    Some(intervals.iter().sum::<i64>() as f64 / intervals.len() as f64)
}

/// Classify a payment history. Anything that is not clearly yearly is monthly.
pub fn detect_cadence(dates: &[NaiveDate], config: &CadenceConfig) -> BillingCycle {
    let Some(avg) = average_gap(dates) else {
        return BillingCycle::Monthly;
    };

    let within = |(lo, hi): (f64, f64)| avg >= lo && avg <= hi;
    if within(config.monthly_days) {
        BillingCycle::Monthly
    } else if within(config.yearly_days) {
        BillingCycle::Yearly
    } else {
        BillingCycle::Monthly
    }
}

/// Whether a group is a recurring service under the given rules
pub fn is_accepted(group: &ServiceGroup, rules: &Rules) -> bool {
    group.transactions.len() >= rules.grouping.min_transactions || rules.accepts_single(&group.name)
}

/// Group, filter and classify transactions
pub fn detect_services(transactions: &[ParsedTransaction], rules: &Rules) -> Vec<DetectedService> {
    group_by_service(transactions, &rules.extractor)
        .into_iter()
        .filter_map(|group| {
            if !is_accepted(&group, rules) {
                debug!(
                    "Ignoring {}: {} payment(s), needs {}",
                    group.name,
                    group.transactions.len(),
                    rules.grouping.min_transactions
                );
                return None;
            }

            let price = group.latest_price()?;
            let billing_cycle = detect_cadence(&group.dates(), &rules.cadence);
            debug!(
                "Detected {} ({} payments, {})",
                group.name,
                group.transactions.len(),
                billing_cycle
            );

            Some(DetectedService {
                price,
                billing_cycle,
                start_date: group.start_date(),
                name: group.name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(date: Option<NaiveDate>, description: &str, amount: i64) -> ParsedTransaction {
        ParsedTransaction {
            date,
            description: description.to_string(),
            amount: Decimal::new(amount, 0),
        }
    }

    fn every(start: NaiveDate, days: i64, count: i64) -> Vec<NaiveDate> {
        (0..count).map(|i| start + Duration::days(days * i)).collect()
    }

    #[test]
    fn test_average_gap() {
        assert_eq!(average_gap(&[]), None);
        assert_eq!(average_gap(&[date(2024, 1, 1)]), None);
        // Order does not matter
        let dates = [date(2024, 3, 1), date(2024, 1, 1), date(2024, 1, 31)];
        assert_eq!(average_gap(&dates), Some(30.0));
    }

    #[test]
    fn test_detect_cadence() {
        let config = CadenceConfig::default();
        let start = date(2023, 1, 10);
        assert_eq!(detect_cadence(&every(start, 30, 4), &config), BillingCycle::Monthly);
        assert_eq!(detect_cadence(&every(start, 365, 3), &config), BillingCycle::Yearly);
        // Outside both windows falls back to monthly
        assert_eq!(detect_cadence(&every(start, 10, 5), &config), BillingCycle::Monthly);
        assert_eq!(detect_cadence(&every(start, 90, 3), &config), BillingCycle::Monthly);
        assert_eq!(detect_cadence(&[start], &config), BillingCycle::Monthly);
    }

    #[test]
    fn test_cadence_bounds_are_inclusive() {
        let config = CadenceConfig::default();
        let start = date(2023, 1, 1);
        assert_eq!(detect_cadence(&every(start, 350, 2), &config), BillingCycle::Yearly);
        assert_eq!(detect_cadence(&every(start, 380, 2), &config), BillingCycle::Yearly);
        assert_eq!(detect_cadence(&every(start, 381, 2), &config), BillingCycle::Monthly);
    }

    #[test]
    fn test_group_by_service_keeps_first_appearance_order() {
        let rules = Rules::embedded().unwrap();
        let transactions = vec![
            tx(Some(date(2024, 1, 3)), "SPOTIFY P2A4F1C", 169),
            tx(Some(date(2024, 1, 5)), "ALBERT HYPERMARKET", 412),
            tx(Some(date(2024, 1, 15)), "NETFLIX.COM", 259),
            tx(Some(date(2024, 2, 3)), "SPOTIFY P2A4F1C", 169),
        ];

        let groups = group_by_service(&transactions, &rules.extractor);
        let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["Spotify", "Netflix"]);
        assert_eq!(groups[0].transactions.len(), 2);
    }

    #[test]
    fn test_latest_price_and_start_date() {
        let group = ServiceGroup {
            name: "Netflix".into(),
            transactions: vec![
                tx(Some(date(2024, 3, 15)), "NETFLIX.COM", 299),
                tx(None, "NETFLIX.COM", 199),
                tx(Some(date(2024, 1, 15)), "NETFLIX.COM", 259),
            ],
        };
        assert_eq!(group.latest_price(), Some(Decimal::new(299, 0)));
        assert_eq!(group.start_date(), Some(date(2024, 1, 15)));
        assert_eq!(group.chronological()[0].date, None);
    }

    #[test]
    fn test_undated_group_has_no_start() {
        let group = ServiceGroup {
            name: "Netflix".into(),
            transactions: vec![tx(None, "NETFLIX.COM", 259), tx(None, "NETFLIX.COM", 279)],
        };
        // File order decides among undated payments
        assert_eq!(group.latest_price(), Some(Decimal::new(279, 0)));
        assert_eq!(group.start_date(), None);
    }

    #[test]
    fn test_detect_services_acceptance() {
        let rules = Rules::embedded().unwrap();
        let transactions = vec![
            // Single payment, but a known single-payment service
            tx(Some(date(2024, 1, 20)), "T-MOBILE CZ", 500),
            // Single payment of a service that needs history
            tx(Some(date(2024, 1, 21)), "TIDAL.COM", 149),
            tx(Some(date(2024, 1, 2)), "PELOTON APP", 390),
            tx(Some(date(2024, 2, 1)), "PELOTON APP", 390),
        ];

        let detected = detect_services(&transactions, &rules);
        let names: Vec<_> = detected.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["T-Mobile", "Peloton"]);
        assert_eq!(
            detected[0],
            DetectedService {
                name: "T-Mobile".into(),
                price: Decimal::new(500, 0),
                billing_cycle: BillingCycle::Monthly,
                start_date: Some(date(2024, 1, 20)),
            }
        );
        assert_eq!(detected[1].start_date, Some(date(2024, 1, 2)));
    }
}
