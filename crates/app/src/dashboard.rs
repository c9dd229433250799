//! Named data collections behind the dashboard and their text rendering.

use std::{
    fmt::{self, Write},
    sync::Arc,
};

use api_types::{
    Amount,
    category::CategoryShare,
    totals::{RecentTotal, TotalSummary},
    transaction::{ExpenseItem, IncomeItem, TransactionRow},
};
use client::{ApiClient, Endpoint, EndpointSource, Listing};
use engine::{
    DataCollection, DataCollectionStore, FetchOrchestrator, FetchStatus, FilterLabel, ResolvedRange,
};

type Store<T> = Arc<DataCollectionStore<T>>;

fn store<T: Listing>(source: EndpointSource<T>, endpoint: Endpoint) -> Store<T> {
    Arc::new(DataCollectionStore::new(endpoint.name(), Arc::new(source)))
}

fn plain<T: Listing>(client: &ApiClient, endpoint: Endpoint) -> Store<T> {
    store(EndpointSource::new(client.clone(), endpoint), endpoint)
}

fn filtered<T: Listing>(client: &ApiClient, endpoint: Endpoint, category: Option<&str>) -> Store<T> {
    let source = EndpointSource::new(client.clone(), endpoint)
        .with_category(category.map(str::to_string));
    store(source, endpoint)
}

pub struct Dashboard {
    pub totals: Store<TotalSummary>,
    pub recent_totals: Store<RecentTotal>,
    pub transactions: Store<TransactionRow>,
    pub recent_transactions: Store<TransactionRow>,
    pub expenses: Store<ExpenseItem>,
    pub incomes: Store<IncomeItem>,
    pub expense_categories: Store<CategoryShare>,
    pub income_categories: Store<CategoryShare>,
    pub expense_transactions: Store<TransactionRow>,
    pub income_transactions: Store<TransactionRow>,
    category: Option<String>,
}

impl Dashboard {
    /// `category` narrows the expense and income lists.
    pub fn new(client: &ApiClient, category: Option<String>) -> Self {
        Self {
            totals: plain(client, Endpoint::Totals),
            recent_totals: plain(client, Endpoint::RecentTotals),
            transactions: plain(client, Endpoint::Transactions),
            recent_transactions: plain(client, Endpoint::RecentTransactions),
            expenses: filtered(client, Endpoint::Expenses, category.as_deref()),
            incomes: filtered(client, Endpoint::Incomes, category.as_deref()),
            expense_categories: plain(client, Endpoint::ExpenseCategories),
            income_categories: plain(client, Endpoint::IncomeCategories),
            expense_transactions: plain(client, Endpoint::ExpenseTransactions),
            income_transactions: plain(client, Endpoint::IncomeTransactions),
            category,
        }
    }

    pub fn register(&self, orchestrator: &mut FetchOrchestrator) {
        orchestrator
            .register(self.totals.clone())
            .register(self.recent_totals.clone())
            .register(self.transactions.clone())
            .register(self.recent_transactions.clone())
            .register(self.expenses.clone())
            .register(self.incomes.clone())
            .register(self.expense_categories.clone())
            .register(self.income_categories.clone())
            .register(self.expense_transactions.clone())
            .register(self.income_transactions.clone());
    }

    pub async fn render(
        &self,
        out: &mut impl Write,
        label: FilterLabel,
        range: &ResolvedRange,
    ) -> fmt::Result {
        writeln!(out, "Range: {label} ({range})")?;

        render_section(out, "Totals", &self.totals.snapshot().await, |t| {
            format!(
                "balance {}  income {}  expense {}",
                t.total_amount, t.total_income, t.total_expense
            )
        })?;
        render_section(
            out,
            "Balance history",
            &self.recent_totals.snapshot().await,
            |p| format!("{}  {:>10}  {:>10}", p.date, p.amount.to_string(), p.total.to_string()),
        )?;
        render_section(
            out,
            "Recent transactions",
            &self.recent_transactions.snapshot().await,
            transaction_line,
        )?;
        render_section(
            out,
            "Transactions",
            &self.transactions.snapshot().await,
            transaction_line,
        )?;
        render_section(
            out,
            "Expense transactions",
            &self.expense_transactions.snapshot().await,
            transaction_line,
        )?;
        render_section(
            out,
            "Income transactions",
            &self.income_transactions.snapshot().await,
            transaction_line,
        )?;

        let expenses = listing_title("Expenses", self.category.as_deref());
        render_section(out, &expenses, &self.expenses.snapshot().await, |e| {
            format!(
                "#{:<5} {}  {:>10}  {} [{}]",
                e.id,
                e.date,
                e.amount.to_string(),
                e.title,
                e.category_name
            )
        })?;
        let incomes = listing_title("Incomes", self.category.as_deref());
        render_section(out, &incomes, &self.incomes.snapshot().await, |i| {
            format!(
                "#{:<5} {}  {:>10}  {} [{}]",
                i.id,
                i.date,
                i.amount.to_string(),
                i.source,
                i.category_name
            )
        })?;

        render_categories(
            out,
            "Expenses by category",
            &self.expense_categories.snapshot().await,
        )?;
        render_categories(
            out,
            "Incomes by category",
            &self.income_categories.snapshot().await,
        )
    }
}

fn listing_title(title: &str, category: Option<&str>) -> String {
    match category {
        Some(category) => format!("{title} in {category}"),
        None => title.to_string(),
    }
}

fn transaction_line(row: &TransactionRow) -> String {
    format!(
        "{}  {:>10}  {} [{}]",
        row.date,
        row.amount.to_string(),
        row.title,
        row.category
    )
}

fn render_categories(
    out: &mut impl Write,
    title: &str,
    collection: &DataCollection<CategoryShare>,
) -> fmt::Result {
    let total: Amount = collection.items.iter().map(|share| share.amount).sum();
    render_section(out, title, collection, |share| {
        format!(
            "{:<20} {:>10} {:>5.1}%",
            share.name,
            share.amount.to_string(),
            percentage(share.amount, total)
        )
    })
}

fn percentage(part: Amount, total: Amount) -> f64 {
    if total == Amount::ZERO {
        return 0.0;
    }
    part.as_f64() / total.as_f64() * 100.0
}

/// Previous items stay listed while a section reloads or after it fails.
fn render_section<T>(
    out: &mut impl Write,
    title: &str,
    collection: &DataCollection<T>,
    line: impl Fn(&T) -> String,
) -> fmt::Result {
    writeln!(out, "\n== {title} ==")?;
    match collection.status {
        FetchStatus::Idle => return writeln!(out, "  (not loaded)"),
        FetchStatus::Loading => writeln!(out, "  loading...")?,
        FetchStatus::Failed => {
            if let Some(err) = &collection.error {
                writeln!(out, "  error: {err}")?;
            }
        }
        FetchStatus::Ready => {
            if collection.items.is_empty() {
                writeln!(out, "  (no data)")?;
            }
        }
    }
    for item in collection.items.iter() {
        writeln!(out, "  {}", line(item))?;
    }
    Ok(())
}
