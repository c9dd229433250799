use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use money::{Amount, AmountError};

mod money;

/// Generic `{"detail": "..."}` body returned by deletes and most errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

pub mod totals {
    use super::*;

    /// Aggregated balance for the whole account.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TotalSummary {
        #[serde(rename = "total amount")]
        pub total_amount: Amount,
        #[serde(rename = "total income")]
        pub total_income: Amount,
        #[serde(rename = "total expense")]
        pub total_expense: Amount,
    }

    /// One point of the running-balance series (oldest first).
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RecentTotal {
        pub date: NaiveDate,
        /// Signed movement of the day: expenses are negative.
        pub amount: Amount,
        /// Running balance after `amount`.
        pub total: Amount,
    }
}

pub mod transaction {
    use super::*;

    /// Merged income/expense row as listed by the transaction endpoints.
    ///
    /// `title` is the expense title or the income source; `amount` is signed.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct TransactionRow {
        pub title: String,
        pub date: NaiveDate,
        pub amount: Amount,
        pub category: String,
        #[serde(default)]
        pub notes: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub icon: Option<String>,
    }

    impl TransactionRow {
        pub fn is_expense(&self) -> bool {
            self.amount.is_negative()
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct ExpenseItem {
        pub id: i64,
        pub user: Option<i64>,
        pub title: String,
        pub amount: Amount,
        #[serde(rename = "categoryName")]
        pub category_name: String,
        pub date: NaiveDate,
        #[serde(default)]
        pub notes: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct IncomeItem {
        pub id: i64,
        pub user: Option<i64>,
        pub source: String,
        pub amount: Amount,
        #[serde(rename = "categoryName")]
        pub category_name: String,
        pub date: NaiveDate,
        #[serde(default)]
        pub notes: String,
    }

    /// Request body for `POST expense/`.
    ///
    /// The category is created server side when it does not exist yet.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub title: String,
        pub amount: Amount,
        pub category: String,
        pub notes: String,
        pub date: NaiveDate,
    }

    /// Request body for `POST income/`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct IncomeNew {
        pub source: String,
        pub amount: Amount,
        pub category: String,
        pub notes: String,
        pub date: NaiveDate,
    }
}

pub mod category {
    use super::*;

    /// Column-oriented category totals as sent by the server.
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct CategoryBreakdown {
        #[serde(default)]
        pub category_name: Vec<String>,
        #[serde(default)]
        pub category_frequency: Vec<Amount>,
    }

    /// One slice of a category breakdown.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CategoryShare {
        pub name: String,
        pub amount: Amount,
    }

    impl CategoryBreakdown {
        /// Zips the two columns into rows, preserving server order.
        ///
        /// Fails when the columns have different lengths.
        pub fn into_shares(self) -> Result<Vec<CategoryShare>, String> {
            if self.category_name.len() != self.category_frequency.len() {
                return Err(format!(
                    "category breakdown has {} names but {} amounts",
                    self.category_name.len(),
                    self.category_frequency.len()
                ));
            }
            Ok(self
                .category_name
                .into_iter()
                .zip(self.category_frequency)
                .map(|(name, amount)| CategoryShare { name, amount })
                .collect())
        }
    }
}

pub mod user {
    use super::*;

    /// Login payload; the server expects the email as `username`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Credentials {
        pub username: String,
        pub password: String,
    }

    /// Request body for `POST users/register/`.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct UserNew {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserProfile {
        pub id: i64,
        pub username: String,
        #[serde(default)]
        pub email: String,
        #[serde(default)]
        pub name: String,
    }

    /// Login response: the profile plus the issued tokens.
    ///
    /// Tokens are also set as http-only cookies, which is what the client
    /// relies on for later calls.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct LoginResponse {
        #[serde(flatten)]
        pub user: UserProfile,
        pub access: Option<String>,
        pub refresh: Option<String>,
    }
}
