//! Statistics - income/expense aggregation over transactions.
//!
//! The pure functions work on whatever slice the caller already filtered (a
//! worker's history, a date range, a month). The async helpers fetch a fresh
//! candidate set and aggregate it; nothing is cached between calls. Soft-deleted
//! rows and rows with an unknown `type` never contribute to a sum.

use crate::{
    core::{timestamp, transaction as transactions},
    entities::{TransactionKind, transaction},
    errors::Result,
};
use chrono::Datelike;
use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Income, expense and their difference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Sum of income amounts
    pub income: i64,
    /// Sum of expense amounts
    pub expense: i64,
    /// `income - expense`
    pub balance: i64,
}

impl Totals {
    fn add(&mut self, transaction: &transaction::Model) {
        match transaction.direction() {
            Some(TransactionKind::Income) => {
                self.income = self.income.saturating_add(transaction.amount);
            }
            Some(TransactionKind::Expense) => {
                self.expense = self.expense.saturating_add(transaction.amount);
            }
            None => {}
        }
        self.balance = self.income.saturating_sub(self.expense);
    }
}

/// Sum of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// Category name as stored
    pub category: String,
    /// Sum of amounts
    pub amount: i64,
}

/// Totals of one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthlyTotal {
    /// 1..=12
    pub month: u32,
    /// Sums for the month
    pub totals: Totals,
}

/// Totals of one day record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyTotal {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Sums for the day
    pub totals: Totals,
    /// Number of counted transactions
    pub count: usize,
}

/// Everything the monthly screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlySummary {
    /// Year of the summary
    pub year: i32,
    /// Month of the summary
    pub month: u32,
    /// Sums over the month
    pub totals: Totals,
    /// Per-day sums, oldest day first
    pub days: Vec<DailyTotal>,
    /// Expense per category, largest first
    pub expense_by_category: Vec<CategoryTotal>,
    /// Income per category, largest first
    pub income_by_category: Vec<CategoryTotal>,
}

/// Sums of one year, month by month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlySummary {
    /// Year of the summary
    pub year: i32,
    /// Sums over the year
    pub totals: Totals,
    /// Twelve entries, January first
    pub months: Vec<MonthlyTotal>,
}

/// Whose transactions to summarise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonRef {
    /// A worker id
    Worker(i64),
    /// An employer id
    Employer(i64),
}

fn counted(transactions: &[transaction::Model]) -> impl Iterator<Item = &transaction::Model> {
    transactions
        .iter()
        .filter(|t| !t.deleted && t.direction().is_some())
}

/// Total income, total expense and balance.
#[must_use]
pub fn totals(transactions: &[transaction::Model]) -> Totals {
    let mut totals = Totals::default();
    for transaction in counted(transactions) {
        totals.add(transaction);
    }
    totals
}

/// Sum per category for one direction, zero sums dropped, largest first.
#[must_use]
pub fn category_breakdown(
    transactions: &[transaction::Model],
    kind: TransactionKind,
) -> Vec<CategoryTotal> {
    let mut sums: HashMap<&str, i64> = HashMap::new();
    for transaction in counted(transactions).filter(|t| t.direction() == Some(kind)) {
        let sum = sums.entry(transaction.category.as_str()).or_default();
        *sum = sum.saturating_add(transaction.amount);
    }

    let mut breakdown: Vec<CategoryTotal> = sums
        .into_iter()
        .filter(|(_, amount)| *amount != 0)
        .map(|(category, amount)| CategoryTotal {
            category: category.to_string(),
            amount,
        })
        .collect();
    breakdown.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.category.cmp(&b.category))
    });
    breakdown
}

/// Twelve monthly totals for `year`; transactions of other years are ignored.
#[must_use]
pub fn monthly_breakdown(transactions: &[transaction::Model], year: i32) -> Vec<MonthlyTotal> {
    let mut months: Vec<MonthlyTotal> = (1..=12)
        .map(|month| MonthlyTotal {
            month,
            totals: Totals::default(),
        })
        .collect();

    for transaction in counted(transactions) {
        let Ok(day) = timestamp::parse_day(&transaction.date) else {
            continue;
        };
        if day.year() != year {
            continue;
        }
        if let Some(entry) = months.get_mut(day.month0() as usize) {
            entry.totals.add(transaction);
        }
    }
    months
}

/// Totals per day, oldest day first.
#[must_use]
pub fn daily_breakdown(transactions: &[transaction::Model]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<&str, (Totals, usize)> = BTreeMap::new();
    for transaction in counted(transactions) {
        let (totals, count) = days.entry(transaction.date.as_str()).or_default();
        totals.add(transaction);
        *count += 1;
    }

    days.into_iter()
        .map(|(date, (totals, count))| DailyTotal {
            date: date.to_string(),
            totals,
            count,
        })
        .collect()
}

/// Recomputes the monthly screen from storage.
pub async fn monthly_summary<C: ConnectionTrait>(
    db: &C,
    year: i32,
    month: u32,
) -> Result<MonthlySummary> {
    let transactions = transactions::get_monthly(db, year, month).await?;
    Ok(MonthlySummary {
        year,
        month,
        totals: totals(&transactions),
        days: daily_breakdown(&transactions),
        expense_by_category: category_breakdown(&transactions, TransactionKind::Expense),
        income_by_category: category_breakdown(&transactions, TransactionKind::Income),
    })
}

/// Recomputes a year's month-by-month totals from storage.
pub async fn yearly_summary<C: ConnectionTrait>(db: &C, year: i32) -> Result<YearlySummary> {
    let transactions = transactions::get_by_date_range(
        db,
        &format!("{year:04}-01-01"),
        &format!("{year:04}-12-31"),
    )
    .await?;
    Ok(YearlySummary {
        year,
        totals: totals(&transactions),
        months: monthly_breakdown(&transactions, year),
    })
}

/// Totals of everything recorded with one worker or employer.
pub async fn person_summary<C: ConnectionTrait>(db: &C, person: PersonRef) -> Result<Totals> {
    let transactions = match person {
        PersonRef::Worker(id) => transactions::get_by_worker_id(db, id).await?,
        PersonRef::Employer(id) => transactions::get_by_employer_id(db, id).await?,
    };
    Ok(totals(&transactions))
}
