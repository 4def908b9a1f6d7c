//! Recurring plan matching.
//!
//! A plan is due in a month when the month overlaps its `[start, end]` range
//! and the month lies a whole number of intervals away from the plan's
//! effective start (its `start`, or the local day it was created).

use crate::{
    clock::{first_of_month, months_between, next_month_start},
    models::Plan,
};
use chrono::{FixedOffset, NaiveDate};

/// The date interval counting starts from.
#[must_use]
pub fn effective_start(plan: &Plan, offset: FixedOffset) -> NaiveDate {
    plan.start
        .unwrap_or_else(|| plan.created_at.with_timezone(&offset).date_naive())
}

/// Decides whether `plan` is due in the month `[month_start, month_end)`.
///
/// Months before the effective start still follow the interval grid, so the
/// remainder is taken with `rem_euclid`.
#[must_use]
pub fn is_due(
    plan: &Plan,
    month_start: NaiveDate,
    month_end: NaiveDate,
    offset: FixedOffset,
) -> bool {
    if plan.interval < 1 {
        return false;
    }
    if plan.start.is_some_and(|start| start >= month_end) {
        return false;
    }
    if plan.end.is_some_and(|end| end < month_start) {
        return false;
    }

    months_between(effective_start(plan, offset), month_start).rem_euclid(plan.interval) == 0
}

/// Keeps the non-deleted plans due in the month containing `month`,
/// preserving their order.
#[must_use]
pub fn due_plans(plans: Vec<Plan>, month: NaiveDate, offset: FixedOffset) -> Vec<Plan> {
    let start = first_of_month(month);
    let end = next_month_start(month);
    plans
        .into_iter()
        .filter(|plan| !plan.is_deleted && is_due(plan, start, end, offset))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::add_months;
    use crate::test_utils::{date, tokyo, utc};

    fn plan(interval: i32, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Plan {
        Plan {
            id: 1,
            name: "Plan".to_string(),
            is_income: false,
            amount: 400,
            interval,
            start,
            end,
            is_deleted: false,
            created_at: utc(2024, 1, 1, 0),
        }
    }

    fn due_in(plan: &Plan, month: NaiveDate) -> bool {
        is_due(plan, month, next_month_start(month), tokyo())
    }

    #[test]
    fn test_monthly_and_bimonthly_plans() {
        let a = plan(1, Some(date(2024, 1, 1)), None);
        let b = plan(2, Some(date(2024, 1, 1)), None);

        assert!(due_in(&a, date(2024, 2, 1)));
        assert!(!due_in(&b, date(2024, 2, 1)));
        assert!(due_in(&b, date(2024, 1, 1)));
        assert!(due_in(&b, date(2024, 3, 1)));
    }

    #[test]
    fn test_exactly_one_due_month_per_interval_block() {
        for interval in 1..=12 {
            let p = plan(interval, Some(date(2024, 5, 20)), None);
            for block in 0..4 {
                let due_count = (0..interval)
                    .filter(|offset| {
                        due_in(&p, add_months(date(2024, 5, 1), block * interval + offset))
                    })
                    .count();
                assert_eq!(due_count, 1, "interval {interval}, block {block}");
            }
        }
    }

    #[test]
    fn test_start_month_is_due_even_mid_month() {
        let p = plan(3, Some(date(2024, 2, 20)), None);
        assert!(due_in(&p, date(2024, 2, 1)));
        assert!(!due_in(&p, date(2024, 1, 1)));
    }

    #[test]
    fn test_end_bound_is_inclusive_of_month_start() {
        let p = plan(1, None, Some(date(2024, 3, 1)));
        assert!(due_in(&p, date(2024, 3, 1)));
        assert!(!due_in(&p, date(2024, 4, 1)));
    }

    #[test]
    fn test_negative_distance_uses_non_negative_remainder() {
        // Without a start bound, months before the creation month still sit on the grid
        let p = plan(3, None, None);
        assert!(due_in(&p, date(2023, 10, 1)));
        assert!(!due_in(&p, date(2023, 11, 1)));
        assert!(!due_in(&p, date(2023, 12, 1)));
        assert!(due_in(&p, date(2024, 4, 1)));
    }

    #[test]
    fn test_effective_start_falls_back_to_local_creation_day() {
        let mut p = plan(2, None, None);
        // 2024-01-31 20:00 UTC is February 1st in +09:00
        p.created_at = utc(2024, 1, 31, 20);

        assert_eq!(effective_start(&p, tokyo()), date(2024, 2, 1));
        assert!(due_in(&p, date(2024, 2, 1)));
        assert!(!due_in(&p, date(2024, 3, 1)));
    }

    #[test]
    fn test_invalid_interval_is_never_due() {
        let p = plan(0, None, None);
        assert!(!due_in(&p, date(2024, 1, 1)));
    }

    #[test]
    fn test_due_plans_drops_deleted() {
        let mut deleted = plan(1, None, None);
        deleted.id = 2;
        deleted.is_deleted = true;

        let kept = due_plans(vec![plan(1, None, None), deleted], date(2024, 2, 14), tokyo());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }
}
