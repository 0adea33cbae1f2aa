//! Bookkeeping for an account: income and expense entries, their totals, a
//! profit-margin calculator and AI advice on the books.

pub mod advice;
mod entries;

use axum::{routing::{get, post}, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub use entries::{add_entry, entries, EntryForm};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(entries::list).post(entries::add))
        .route("/summary", get(entries::summary))
        .route("/margin", get(entries::margin))
        .route("/advice", post(advice::advice))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(default)]
    pub id: String,
    pub kind: EntryKind,
    /// Whole rupiah.
    pub amount: i64,
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub income: i64,
    pub expense: i64,
    pub balance: i64,
}

pub fn summarize(entries: &[LedgerEntry]) -> Summary {
    let (income, expense) = entries.iter().fold((0i64, 0i64), |(income, expense), entry| match entry.kind {
        EntryKind::Income => (income.saturating_add(entry.amount), expense),
        EntryKind::Expense => (income, expense.saturating_add(entry.amount)),
    });

    Summary {
        income,
        expense,
        balance: income.saturating_sub(expense),
    }
}

/// Newest first; entries on the same day keep the most recently recorded on top.
pub fn sort_entries(entries: &mut [LedgerEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Margin {
    pub profit: i64,
    pub margin_percent: f64,
}

/// Profit per unit sold at `price` with unit `cost`, and that profit as a
/// percentage of the price. A zero price has a zero margin.
pub fn profit_margin(cost: i64, price: i64) -> Margin {
    let profit = price.saturating_sub(cost);
    let margin_percent = if price == 0 {
        0.0
    } else {
        profit as f64 / price as f64 * 100.0
    };
    Margin { profit, margin_percent }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(kind: EntryKind, amount: i64, date: &str, created_at: i64) -> LedgerEntry {
        LedgerEntry {
            id: format!("e{created_at}"),
            kind,
            amount,
            description: "x".into(),
            date: date.into(),
            created_at,
        }
    }

    #[test]
    fn balance_is_income_minus_expense() {
        let entries = [
            entry(EntryKind::Income, 100_000, "2024-05-01", 1),
            entry(EntryKind::Expense, 40_000, "2024-05-02", 2),
        ];
        assert_eq!(
            summarize(&entries),
            Summary { income: 100_000, expense: 40_000, balance: 60_000 }
        );
        assert_eq!(summarize(&[]), Summary::default());
    }

    #[test]
    fn entries_sort_by_date_descending() {
        let mut entries = vec![
            entry(EntryKind::Income, 1, "2024-05-01", 1),
            entry(EntryKind::Income, 1, "2024-06-01", 2),
            entry(EntryKind::Expense, 1, "2024-05-01", 3),
        ];
        sort_entries(&mut entries);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e2", "e3", "e1"]);
    }

    #[test]
    fn margin_of_a_coffee() {
        let margin = profit_margin(12_000, 20_000);
        assert_eq!(margin.profit, 8_000);
        assert!((margin.margin_percent - 40.0).abs() < 1e-9);

        let loss = profit_margin(25_000, 20_000);
        assert_eq!(loss.profit, -5_000);
        assert!(loss.margin_percent < 0.0);

        assert_eq!(profit_margin(1_000, 0).margin_percent, 0.0);
    }

    #[test]
    fn extreme_inputs_saturate() {
        assert_eq!(profit_margin(i64::MIN, 1).profit, i64::MAX);
        assert_eq!(profit_margin(i64::MAX, -1).profit, i64::MIN);
        assert!(profit_margin(i64::MIN, 1).margin_percent.is_finite());
    }
}
