//! Totals and date-filtered views derived from a transaction snapshot.
//!
//! Everything here is pure: each function takes a snapshot and returns a new
//! list or value, and is recomputed on every read.

use serde::Serialize;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::transaction::record::{Transaction, TransactionType};

/// The window, in days, of the dashboard's recent transactions.
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Income, expense and their difference over a list of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    /// Sum of the amounts of income transactions.
    pub income: f64,
    /// Sum of the amounts of expense transactions.
    pub expense: f64,
    /// `income - expense`.
    pub net: f64,
}

/// Keep the transactions whose local calendar date falls within
/// `[start, end]`, both ends inclusive.
///
/// A missing bound leaves that side open. `start` counts from 00:00:00 and
/// `end` runs through 23:59:59 of the day in `local_offset`.
pub fn filter_by_date_range(
    transactions: &[Transaction],
    start: Option<Date>,
    end: Option<Date>,
    local_offset: UtcOffset,
) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| {
            let day = transaction.date.to_offset(local_offset).date();

            start.is_none_or(|start| day >= start) && end.is_none_or(|end| day <= end)
        })
        .cloned()
        .collect()
}

/// Order transactions by date, newest first or oldest first.
///
/// The sort is stable, so transactions with equal dates keep their relative
/// order from the input.
pub fn sort_by_date(transactions: &[Transaction], newest_first: bool) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();

    if newest_first {
        sorted.sort_by(|a, b| b.date.cmp(&a.date));
    } else {
        sorted.sort_by(|a, b| a.date.cmp(&b.date));
    }

    sorted
}

/// Sum income and expenses.
///
/// Non-finite amounts count as zero.
pub fn aggregate(transactions: &[Transaction]) -> Totals {
    let (income, expense) =
        transactions
            .iter()
            .fold((0.0, 0.0), |(income, expense), transaction| {
                let amount = if transaction.amount.is_finite() {
                    transaction.amount
                } else {
                    0.0
                };

                match transaction.kind {
                    TransactionType::Income => (income + amount, expense),
                    TransactionType::Expense => (income, expense + amount),
                }
            });

    Totals {
        income,
        expense,
        net: income - expense,
    }
}

/// Keep the transactions dated no earlier than `window_days` days before
/// `reference`.
pub fn recent(
    transactions: &[Transaction],
    window_days: i64,
    reference: OffsetDateTime,
) -> Vec<Transaction> {
    let cutoff = reference - Duration::days(window_days);

    transactions
        .iter()
        .filter(|transaction| transaction.date >= cutoff)
        .cloned()
        .collect()
}

/// The figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Transactions from the last [RECENT_WINDOW_DAYS] days, newest first.
    pub recent: Vec<Transaction>,
    /// Totals over `recent`.
    pub recent_totals: Totals,
    /// Totals over the transactions dated today in local time.
    pub today_totals: Totals,
}

/// Build the dashboard figures for `now` in `local_offset`.
pub fn dashboard_summary(
    transactions: &[Transaction],
    now: OffsetDateTime,
    local_offset: UtcOffset,
) -> DashboardSummary {
    let recent_transactions = sort_by_date(&recent(transactions, RECENT_WINDOW_DAYS, now), true);
    let recent_totals = aggregate(&recent_transactions);

    let today = now.to_offset(local_offset).date();
    let today_totals = aggregate(&filter_by_date_range(
        transactions,
        Some(today),
        Some(today),
        local_offset,
    ));

    DashboardSummary {
        recent: recent_transactions,
        recent_totals,
        today_totals,
    }
}

#[cfg(test)]
mod summary_tests {
    use time::{
        OffsetDateTime, UtcOffset,
        macros::{date, datetime, offset},
    };

    use crate::transaction::{
        Transaction, TransactionType,
        summary::{
            Totals, aggregate, dashboard_summary, filter_by_date_range, recent, sort_by_date,
        },
    };

    fn transaction(
        id: &str,
        kind: TransactionType,
        amount: f64,
        date: OffsetDateTime,
    ) -> Transaction {
        Transaction {
            id: id.to_owned(),
            kind,
            description: String::new(),
            amount,
            date,
        }
    }

    fn ids(transactions: &[Transaction]) -> Vec<&str> {
        transactions.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn aggregate_single_income() {
        let transactions = [Transaction {
            id: "1".to_owned(),
            kind: TransactionType::Income,
            description: "Gaji".to_owned(),
            amount: 1_000_000.0,
            date: datetime!(2024-01-05 00:00:00 UTC),
        }];

        assert_eq!(
            aggregate(&transactions),
            Totals {
                income: 1_000_000.0,
                expense: 0.0,
                net: 1_000_000.0
            }
        );
    }

    #[test]
    fn aggregate_empty_list_is_zero() {
        assert_eq!(aggregate(&[]), Totals::default());
    }

    #[test]
    fn aggregate_net_is_income_minus_expense() {
        let date = datetime!(2024-01-05 00:00:00 UTC);
        let transactions = [
            transaction("1", TransactionType::Income, 500.0, date),
            transaction("2", TransactionType::Expense, 120.5, date),
            transaction("3", TransactionType::Expense, 79.5, date),
            transaction("4", TransactionType::Income, 100.0, date),
        ];

        let got = aggregate(&transactions);

        assert_eq!(got.income, 600.0);
        assert_eq!(got.expense, 200.0);
        assert_eq!(got.income - got.expense, got.net);
    }

    #[test]
    fn aggregate_treats_non_finite_amounts_as_zero() {
        let date = datetime!(2024-01-05 00:00:00 UTC);
        let transactions = [
            transaction("1", TransactionType::Income, f64::NAN, date),
            transaction("2", TransactionType::Expense, f64::INFINITY, date),
            transaction("3", TransactionType::Income, 10.0, date),
        ];

        assert_eq!(
            aggregate(&transactions),
            Totals {
                income: 10.0,
                expense: 0.0,
                net: 10.0
            }
        );
    }

    #[test]
    fn sort_newest_first_by_default_order() {
        let transactions = [
            transaction("old", TransactionType::Income, 1.0, datetime!(2024-01-01 00:00:00 UTC)),
            transaction("new", TransactionType::Income, 1.0, datetime!(2024-03-01 00:00:00 UTC)),
            transaction("mid", TransactionType::Income, 1.0, datetime!(2024-02-01 00:00:00 UTC)),
        ];

        assert_eq!(ids(&sort_by_date(&transactions, true)), ["new", "mid", "old"]);
        assert_eq!(ids(&sort_by_date(&transactions, false)), ["old", "mid", "new"]);
    }

    #[test]
    fn sort_is_stable_for_equal_dates() {
        let tie = datetime!(2024-02-01 00:00:00 UTC);
        let transactions = [
            transaction("a", TransactionType::Income, 1.0, tie),
            transaction("old", TransactionType::Income, 1.0, datetime!(2024-01-01 00:00:00 UTC)),
            transaction("b", TransactionType::Expense, 1.0, tie),
            transaction("c", TransactionType::Income, 1.0, tie),
        ];

        let newest_first = sort_by_date(&transactions, true);
        let oldest_first = sort_by_date(&newest_first, false);

        assert_eq!(ids(&newest_first), ["a", "b", "c", "old"]);
        assert_eq!(ids(&oldest_first), ["old", "a", "b", "c"]);
    }

    #[test]
    fn filter_includes_whole_end_day() {
        let transactions = [
            transaction("before", TransactionType::Income, 1.0, datetime!(2024-01-04 23:59:59 UTC)),
            transaction("start", TransactionType::Income, 1.0, datetime!(2024-01-05 00:00:00 UTC)),
            transaction(
                "end",
                TransactionType::Income,
                1.0,
                datetime!(2024-01-06 23:59:59.999 UTC),
            ),
            transaction("after", TransactionType::Income, 1.0, datetime!(2024-01-07 00:00:00 UTC)),
        ];

        let got = filter_by_date_range(
            &transactions,
            Some(date!(2024-01-05)),
            Some(date!(2024-01-06)),
            UtcOffset::UTC,
        );

        assert_eq!(ids(&got), ["start", "end"]);
    }

    #[test]
    fn filter_uses_local_calendar_day() {
        // 20:00 UTC on the 4th is 03:00 on the 5th in UTC+7.
        let transactions = [transaction(
            "1",
            TransactionType::Expense,
            1.0,
            datetime!(2024-01-04 20:00:00 UTC),
        )];

        let got = filter_by_date_range(&transactions, Some(date!(2024-01-05)), None, offset!(+7));

        assert_eq!(ids(&got), ["1"]);
    }

    #[test]
    fn filter_with_open_bounds() {
        let transactions = [
            transaction("a", TransactionType::Income, 1.0, datetime!(2023-06-01 00:00:00 UTC)),
            transaction("b", TransactionType::Income, 1.0, datetime!(2024-06-01 00:00:00 UTC)),
        ];

        let all = filter_by_date_range(&transactions, None, None, UtcOffset::UTC);
        let until =
            filter_by_date_range(&transactions, None, Some(date!(2023-12-31)), UtcOffset::UTC);
        let from =
            filter_by_date_range(&transactions, Some(date!(2024-01-01)), None, UtcOffset::UTC);

        assert_eq!(ids(&all), ["a", "b"]);
        assert_eq!(ids(&until), ["a"]);
        assert_eq!(ids(&from), ["b"]);
    }

    #[test]
    fn filter_is_idempotent() {
        let transactions = [
            transaction("a", TransactionType::Income, 1.0, datetime!(2024-01-01 00:00:00 UTC)),
            transaction("b", TransactionType::Income, 1.0, datetime!(2024-01-10 00:00:00 UTC)),
            transaction("c", TransactionType::Income, 1.0, datetime!(2024-01-20 00:00:00 UTC)),
        ];
        let start = Some(date!(2024-01-05));
        let end = Some(date!(2024-01-15));

        let once = filter_by_date_range(&transactions, start, end, UtcOffset::UTC);
        let twice = filter_by_date_range(&once, start, end, UtcOffset::UTC);

        assert_eq!(once, twice);
    }

    #[test]
    fn recent_keeps_window_boundary() {
        let now = datetime!(2024-03-31 12:00:00 UTC);
        let transactions = [
            transaction("edge", TransactionType::Income, 1.0, datetime!(2024-03-01 12:00:00 UTC)),
            transaction(
                "outside",
                TransactionType::Income,
                1.0,
                datetime!(2024-03-01 11:59:59 UTC),
            ),
            transaction("inside", TransactionType::Income, 1.0, datetime!(2024-03-30 00:00:00 UTC)),
        ];

        let got = recent(&transactions, 30, now);

        assert_eq!(ids(&got), ["edge", "inside"]);
    }

    #[test]
    fn dashboard_summary_splits_recent_and_today() {
        let now = datetime!(2024-03-31 12:00:00 UTC);
        let transactions = [
            transaction(
                "today-in",
                TransactionType::Income,
                100.0,
                datetime!(2024-03-31 08:00:00 UTC),
            ),
            transaction(
                "today-out",
                TransactionType::Expense,
                30.0,
                datetime!(2024-03-31 09:00:00 UTC),
            ),
            transaction("week", TransactionType::Expense, 20.0, datetime!(2024-03-25 09:00:00 UTC)),
            transaction(
                "ancient",
                TransactionType::Income,
                999.0,
                datetime!(2023-01-01 00:00:00 UTC),
            ),
        ];

        let got = dashboard_summary(&transactions, now, UtcOffset::UTC);

        assert_eq!(ids(&got.recent), ["today-out", "today-in", "week"]);
        assert_eq!(
            got.recent_totals,
            Totals {
                income: 100.0,
                expense: 50.0,
                net: 50.0
            }
        );
        assert_eq!(
            got.today_totals,
            Totals {
                income: 100.0,
                expense: 30.0,
                net: 70.0
            }
        );
    }
}
