//! Next payment projection
//!
//! The current period's payment is an offset in whole months from the start
//! date, clamped to the last day of short months. A monthly payment already
//! due moves one calendar month on from that clamped date, so a subscription
//! started on the 31st and due on Apr 30 next bills on May 30. Yearly
//! anniversaries are never chained: one started on Feb 29 bills on Feb 28 in
//! non-leap years and on Feb 29 in leap years.

use chrono::{Datelike, Local, Months, NaiveDate};

use crate::models::BillingCycle;

/// Next payment on or after `today` for a subscription that started on `start`.
///
/// A start date in the future is itself the next payment. Monthly payments
/// due today are considered paid, so the result is strictly after `today`;
/// a yearly anniversary falling on `today` is returned as is.
pub fn project(start: NaiveDate, cycle: BillingCycle, today: NaiveDate) -> NaiveDate {
    if start > today {
        return start;
    }

    match cycle {
        BillingCycle::Monthly => {
            let elapsed = months_between(start, today);
            let candidate = add_months(start, elapsed);
            if candidate > today {
                candidate
            } else {
                add_months(candidate, 1)
            }
        }
        BillingCycle::Yearly => {
            let mut years = (today.year() - start.year()) as u32;
            let mut candidate = add_months(start, years * 12);
            while candidate < today {
                years += 1;
                candidate = add_months(start, years * 12);
            }
            candidate
        }
    }
}

/// [`project`] against the local calendar date
pub fn project_from_today(start: NaiveDate, cycle: BillingCycle) -> NaiveDate {
    project(start, cycle, Local::now().date_naive())
}

/// Calendar months from `start`'s month to `end`'s month. `start <= end`.
fn months_between(start: NaiveDate, end: NaiveDate) -> u32 {
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    months.max(0) as u32
}

/// `date` shifted by whole months, clamped to the last day of short months
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}
