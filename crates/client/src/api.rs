use api_types::{
    Detail,
    category::CategoryShare,
    totals::{RecentTotal, TotalSummary},
    transaction::{ExpenseItem, ExpenseNew, IncomeItem, IncomeNew, TransactionRow},
    user::{Credentials, LoginResponse, UserNew, UserProfile},
};
use engine::ResolvedRange;
use reqwest::{Method, RequestBuilder, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    endpoint::{Endpoint, Listing},
    error::{ClientError, Result},
};

#[derive(Debug, serde::Deserialize)]
struct ErrorBody {
    #[serde(alias = "error", alias = "message")]
    detail: String,
}

/// HTTP client for the expense tracker REST API.
///
/// Authentication is cookie based: `login` stores the `access_token` cookie
/// set by the server and every later call sends it back.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        let http = reqwest::Client::builder().cookie_store(true).build()?;
        Ok(Self { base_url, http })
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))?;
        Ok(self.http.request(method, endpoint))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let res = req.send().await?;
        let status = res.status();
        let body = res.bytes().await?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&body)?);
        }

        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|err| err.detail)
            .unwrap_or_else(|_| "unknown error".to_string());
        tracing::debug!(status = status.as_u16(), "request rejected: {message}");
        Err(ClientError::from_status(status.as_u16(), message))
    }

    async fn send_text(&self, req: RequestBuilder) -> Result<String> {
        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.text().await?);
        }
        let message = res
            .json::<ErrorBody>()
            .await
            .map(|err| err.detail)
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(ClientError::from_status(status.as_u16(), message))
    }

    async fn post_json<TReq: Serialize + ?Sized, TResp: DeserializeOwned>(
        &self,
        path: &str,
        body: &TReq,
    ) -> Result<TResp> {
        let req = self.request(Method::POST, path)?.json(body);
        self.send(req).await
    }

    /// GETs a list endpoint with the range (and endpoint extras) as query.
    pub async fn list<W: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        range: &ResolvedRange,
        category: Option<&str>,
    ) -> Result<W> {
        let req = self
            .request(Method::GET, endpoint.path())?
            .query(&endpoint.query(range, category));
        tracing::debug!(endpoint = endpoint.name(), %range, "GET");
        self.send(req).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let credentials = Credentials {
            username: email.to_string(),
            password: password.to_string(),
        };
        let res: LoginResponse = self.post_json("users/login/", &credentials).await?;
        tracing::info!(user = %res.user.username, "logged in");
        Ok(res)
    }

    pub async fn logout(&self) -> Result<()> {
        let req = self
            .request(Method::POST, "users/logout/")?
            .json(&serde_json::json!({}));
        self.send_text(req).await?;
        Ok(())
    }

    pub async fn register(&self, user: &UserNew) -> Result<UserProfile> {
        self.post_json("users/register/", user).await
    }

    pub async fn fetch_user(&self) -> Result<UserProfile> {
        let req = self.request(Method::GET, "users/fetch/")?;
        self.send(req).await
    }

    pub async fn totals(&self, range: &ResolvedRange) -> Result<TotalSummary> {
        self.list(Endpoint::Totals, range, None).await
    }

    pub async fn recent_totals(&self, range: &ResolvedRange) -> Result<Vec<RecentTotal>> {
        self.list(Endpoint::RecentTotals, range, None).await
    }

    pub async fn transactions(&self, range: &ResolvedRange) -> Result<Vec<TransactionRow>> {
        self.list(Endpoint::Transactions, range, None).await
    }

    pub async fn recent_transactions(&self, range: &ResolvedRange) -> Result<Vec<TransactionRow>> {
        self.list(Endpoint::RecentTransactions, range, None).await
    }

    pub async fn expenses(
        &self,
        range: &ResolvedRange,
        category: Option<&str>,
    ) -> Result<Vec<ExpenseItem>> {
        self.list(Endpoint::Expenses, range, category).await
    }

    pub async fn incomes(
        &self,
        range: &ResolvedRange,
        category: Option<&str>,
    ) -> Result<Vec<IncomeItem>> {
        self.list(Endpoint::Incomes, range, category).await
    }

    pub async fn expense_categories(&self, range: &ResolvedRange) -> Result<Vec<CategoryShare>> {
        CategoryShare::into_items(self.list(Endpoint::ExpenseCategories, range, None).await?)
    }

    pub async fn income_categories(&self, range: &ResolvedRange) -> Result<Vec<CategoryShare>> {
        CategoryShare::into_items(self.list(Endpoint::IncomeCategories, range, None).await?)
    }

    pub async fn expense_transactions(
        &self,
        range: &ResolvedRange,
    ) -> Result<Vec<TransactionRow>> {
        self.list(Endpoint::ExpenseTransactions, range, None).await
    }

    pub async fn income_transactions(&self, range: &ResolvedRange) -> Result<Vec<TransactionRow>> {
        self.list(Endpoint::IncomeTransactions, range, None).await
    }

    /// Server-rendered CSV of all transactions, newest first.
    pub async fn export_csv(&self, range: &ResolvedRange) -> Result<String> {
        let req = self
            .request(Method::GET, "users/transactions/csv/")?
            .query(&range.query_pairs());
        self.send_text(req).await
    }

    pub async fn create_expense(&self, expense: &ExpenseNew) -> Result<ExpenseItem> {
        self.post_json("expense/", expense).await
    }

    pub async fn create_income(&self, income: &IncomeNew) -> Result<IncomeItem> {
        self.post_json("income/", income).await
    }

    pub async fn delete_expense(&self, id: i64) -> Result<Detail> {
        let req = self.request(Method::DELETE, &format!("expense/{id}"))?;
        self.send(req).await
    }

    pub async fn delete_income(&self, id: i64) -> Result<Detail> {
        let req = self.request(Method::DELETE, &format!("income/{id}"))?;
        self.send(req).await
    }
}
