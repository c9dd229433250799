//! Read endpoints and their adapters onto engine data sources.

use std::{fmt, marker::PhantomData};

use api_types::{
    category::{CategoryBreakdown, CategoryShare},
    totals::{RecentTotal, TotalSummary},
    transaction::{ExpenseItem, IncomeItem, TransactionRow},
};
use async_trait::async_trait;
use engine::{FetchError, ResolvedRange, Source};
use serde::de::DeserializeOwned;

use crate::{
    api::ApiClient,
    error::{ClientError, Result},
};

/// Rows returned by the dashboard's "recent transactions" widget.
const RECENT_LIMIT: u32 = 10;

/// Every filterable list or summary endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Totals,
    RecentTotals,
    Transactions,
    RecentTransactions,
    Expenses,
    Incomes,
    ExpenseCategories,
    IncomeCategories,
    ExpenseTransactions,
    IncomeTransactions,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::Totals => "users/total/",
            Self::RecentTotals => "users/recent-total/",
            Self::Transactions => "users/transactions-total/",
            Self::RecentTransactions => "users/transactions/",
            Self::Expenses => "expense/",
            Self::Incomes => "income/",
            Self::ExpenseCategories => "expense/expenseCategory/",
            Self::IncomeCategories => "income/categoryIncome/",
            Self::ExpenseTransactions => "expense/transactions/",
            Self::IncomeTransactions => "income/transactions/",
        }
    }

    /// Name used for the matching data collection.
    pub fn name(self) -> &'static str {
        match self {
            Self::Totals => "totals",
            Self::RecentTotals => "recent_totals",
            Self::Transactions => "transactions",
            Self::RecentTransactions => "recent_transactions",
            Self::Expenses => "expenses",
            Self::Incomes => "incomes",
            Self::ExpenseCategories => "expense_categories",
            Self::IncomeCategories => "income_categories",
            Self::ExpenseTransactions => "expense_transactions",
            Self::IncomeTransactions => "income_transactions",
        }
    }

    /// Query string: the resolved range plus endpoint specific parameters.
    ///
    /// `category` narrows the expense and income lists; other endpoints
    /// ignore it.
    pub fn query(
        self,
        range: &ResolvedRange,
        category: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut pairs = range.query_pairs();
        match self {
            Self::RecentTransactions => pairs.push(("limit", RECENT_LIMIT.to_string())),
            Self::Expenses | Self::Incomes => {
                if let Some(category) = category.filter(|c| !c.is_empty()) {
                    pairs.push(("category", category.to_string()));
                }
            }
            _ => {}
        }
        pairs
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Item type of a data collection, decoded from an endpoint's wire shape.
pub trait Listing: Sized + Send + Sync + 'static {
    type Wire: DeserializeOwned + Send;

    fn into_items(wire: Self::Wire) -> Result<Vec<Self>>;
}

impl Listing for TotalSummary {
    type Wire = TotalSummary;

    fn into_items(wire: Self::Wire) -> Result<Vec<Self>> {
        Ok(vec![wire])
    }
}

impl Listing for RecentTotal {
    type Wire = Vec<RecentTotal>;

    fn into_items(wire: Self::Wire) -> Result<Vec<Self>> {
        Ok(wire)
    }
}

impl Listing for TransactionRow {
    type Wire = Vec<TransactionRow>;

    fn into_items(wire: Self::Wire) -> Result<Vec<Self>> {
        Ok(wire)
    }
}

impl Listing for ExpenseItem {
    type Wire = Vec<ExpenseItem>;

    fn into_items(wire: Self::Wire) -> Result<Vec<Self>> {
        Ok(wire)
    }
}

impl Listing for IncomeItem {
    type Wire = Vec<IncomeItem>;

    fn into_items(wire: Self::Wire) -> Result<Vec<Self>> {
        Ok(wire)
    }
}

impl Listing for CategoryShare {
    type Wire = CategoryBreakdown;

    fn into_items(wire: Self::Wire) -> Result<Vec<Self>> {
        wire.into_shares().map_err(ClientError::Decode)
    }
}

/// [`Source`] backed by one REST endpoint.
///
/// A payload that does not match `T`'s wire shape fails the fetch with
/// [`FetchError::Malformed`].
pub struct EndpointSource<T> {
    client: ApiClient,
    endpoint: Endpoint,
    category: Option<String>,
    _item: PhantomData<fn() -> T>,
}

impl<T: Listing> EndpointSource<T> {
    pub fn new(client: ApiClient, endpoint: Endpoint) -> Self {
        Self {
            client,
            endpoint,
            category: None,
            _item: PhantomData,
        }
    }

    /// Only list items of `category` (expense and income lists).
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }
}

#[async_trait]
impl<T: Listing> Source<T> for EndpointSource<T> {
    async fn fetch(&self, range: &ResolvedRange) -> std::result::Result<Vec<T>, FetchError> {
        let wire: T::Wire = self
            .client
            .list(self.endpoint, range, self.category.as_deref())
            .await?;
        Ok(T::into_items(wire)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn recent_transactions_are_limited() {
        let range = ResolvedRange::between(
            NaiveDate::from_ymd_opt(2025, 2, 15).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
        );
        assert_eq!(
            Endpoint::RecentTransactions.query(&range, Some("Food")),
            vec![
                ("from", "2025-02-15".to_string()),
                ("to", "2025-03-15".to_string()),
                ("limit", "10".to_string()),
            ]
        );
        assert!(Endpoint::Totals.query(&ResolvedRange::unbounded(), None).is_empty());
    }

    #[test]
    fn category_only_narrows_item_lists() {
        let all = ResolvedRange::unbounded();
        assert_eq!(
            Endpoint::Expenses.query(&all, Some("Food")),
            vec![("category", "Food".to_string())]
        );
        assert_eq!(
            Endpoint::Incomes.query(&all, Some("Job")),
            vec![("category", "Job".to_string())]
        );
        assert!(Endpoint::Incomes.query(&all, Some("")).is_empty());
        assert!(Endpoint::ExpenseCategories.query(&all, Some("Food")).is_empty());
    }

    #[test]
    fn paths_are_relative() {
        for endpoint in [
            Endpoint::Totals,
            Endpoint::ExpenseCategories,
            Endpoint::IncomeTransactions,
        ] {
            assert!(!endpoint.path().starts_with('/'));
            assert!(endpoint.path().ends_with('/'));
        }
    }
}
