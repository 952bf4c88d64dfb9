use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    Cents, CustomerField, CustomerTotals, InvoiceDetail, InvoiceId, InvoiceStatus,
    FilteredInvoiceRow, InvoiceUpdate, LatestInvoiceRow, NewInvoice, Revenue,
};

use super::{RemoteStore, escape_like};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Rows requested per round trip by [`RestStore::select_all`].
const SELECT_PAGE_SIZE: usize = 1000;

/// Store backed by a hosted PostgREST endpoint.
///
/// Tables live under `/rest/v1/<table>` and procedures under
/// `/rest/v1/rpc/<name>`. The access key is sent both as the `apikey`
/// header and as a bearer token.
#[derive(Debug)]
pub struct RestStore {
    client: Client,
    base_url: String,
    key: String,
}

/// Customer fields embedded in an invoice row.
#[derive(Debug, Deserialize)]
struct EmbeddedCustomer {
    name: String,
    email: String,
    image_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestInvoiceJson {
    id: InvoiceId,
    amount: Cents,
    date: NaiveDate,
    customers: Option<EmbeddedCustomer>,
}

#[derive(Debug, Deserialize)]
struct InvoiceJson {
    id: InvoiceId,
    customer_id: Uuid,
    amount: Cents,
    status: InvoiceStatus,
    date: NaiveDate,
    customers: Option<EmbeddedCustomer>,
}

#[derive(Debug, Deserialize)]
struct AmountJson {
    amount: Cents,
}

#[derive(Debug, Deserialize)]
struct EmbeddedInvoice {
    amount: Cents,
    status: InvoiceStatus,
}

#[derive(Debug, Deserialize)]
struct CustomerWithInvoicesJson {
    id: Uuid,
    name: String,
    email: String,
    image_url: String,
    #[serde(default)]
    invoices: Vec<EmbeddedInvoice>,
}

impl From<CustomerWithInvoicesJson> for CustomerTotals {
    fn from(customer: CustomerWithInvoicesJson) -> Self {
        let sum_for = |status: InvoiceStatus| -> Cents {
            customer
                .invoices
                .iter()
                .filter(|i| i.status == status)
                .map(|i| i.amount)
                .sum()
        };
        let total_pending = sum_for(InvoiceStatus::Pending);
        let total_paid = sum_for(InvoiceStatus::Paid);

        Self {
            id: customer.id,
            total_invoices: customer.invoices.len() as i64,
            total_pending,
            total_paid,
            name: customer.name,
            email: customer.email,
            image_url: customer.image_url,
        }
    }
}

impl RestStore {
    /// Create a client for the endpoint at `base_url`.
    pub fn new(base_url: &str, key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn rpc_url(&self, procedure: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, procedure)
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Request failed: {}", what))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} returned {}: {}", what, status, body);
        }
        Ok(response)
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T> {
        self.send(request, what)
            .await?
            .json::<T>()
            .await
            .with_context(|| format!("Invalid response body: {}", what))
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<Vec<T>> {
        let request = self
            .request(Method::GET, self.table_url(table))
            .query(params);
        self.fetch_json(request, what).await
    }

    /// Every row of a select. The server may cap a response below the
    /// requested limit, so pages are read until the `Content-Range` total
    /// is reached.
    async fn select_all<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
        what: &str,
    ) -> Result<Vec<T>> {
        let mut rows: Vec<T> = Vec::new();
        loop {
            let request = self
                .request(Method::GET, self.table_url(table))
                .query(params)
                .query(&[
                    ("offset", rows.len().to_string()),
                    ("limit", SELECT_PAGE_SIZE.to_string()),
                ])
                .header("Prefer", "count=exact");
            let response = self.send(request, what).await?;
            let total = content_range_total(&response, what)?;
            let page: Vec<T> = response
                .json()
                .await
                .with_context(|| format!("Invalid response body: {}", what))?;

            let fetched = page.len();
            rows.extend(page);
            let read = rows.len() as i64;
            if read >= total {
                return Ok(rows);
            }
            if fetched == 0 {
                anyhow::bail!("{} stopped after {} of {} rows", what, read, total);
            }
        }
    }

    async fn rpc<T: DeserializeOwned>(
        &self,
        procedure: &str,
        args: serde_json::Value,
    ) -> Result<T> {
        let request = self
            .request(Method::POST, self.rpc_url(procedure))
            .json(&args);
        self.fetch_json(request, procedure).await
    }

    /// Exact row count of `table`, read from the `Content-Range` header.
    async fn count(&self, table: &str) -> Result<i64> {
        let request = self
            .request(Method::HEAD, self.table_url(table))
            .query(&[("select", "id")])
            .header("Prefer", "count=exact");
        let response = self.send(request, table).await?;
        content_range_total(&response, table)
    }

    /// Write request returning the affected rows' ids.
    async fn write_by_id(
        &self,
        method: Method,
        id: InvoiceId,
        body: Option<serde_json::Value>,
    ) -> Result<u64> {
        let mut request = self
            .request(method, self.table_url("invoices"))
            .query(&[("id", format!("eq.{}", id)), ("select", "id".to_string())])
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            request = request.json(&body);
        }

        let rows: Vec<IgnoredAny> = self.fetch_json(request, "invoices").await?;
        Ok(rows.len() as u64)
    }
}

/// Row total announced by a response sent with `Prefer: count=exact`.
fn content_range_total(response: &Response, what: &str) -> Result<i64> {
    let header = response
        .headers()
        .get(reqwest::header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| anyhow::anyhow!("Missing Content-Range header: {}", what))?;

    parse_content_range_total(header)
        .ok_or_else(|| anyhow::anyhow!("Invalid Content-Range header: {}", header))
}

/// Total from a `Content-Range` value such as `0-24/3573` or `*/0`.
pub fn parse_content_range_total(header: &str) -> Option<i64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// `or` filter matching `search` as a substring of name or email.
fn name_or_email_filter(search: &str) -> String {
    let needle = format!("*{}*", escape_like(search.trim()));
    let quoted = needle.replace('\\', "\\\\").replace('"', "\\\"");
    format!("(name.ilike.\"{0}\",email.ilike.\"{0}\")", quoted)
}

#[async_trait]
impl RemoteStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn revenue(&self) -> Result<Vec<Revenue>> {
        self.select("revenue", &[("select", "month,revenue".to_string())], "revenue")
            .await
    }

    async fn latest_invoices(&self, limit: usize) -> Result<Vec<LatestInvoiceRow>> {
        let rows: Vec<LatestInvoiceJson> = self
            .select(
                "invoices",
                &[
                    ("select", "id,amount,date,customers(name,email,image_url)".to_string()),
                    ("order", "date.desc,id.asc".to_string()),
                    ("limit", limit.to_string()),
                ],
                "latest invoices",
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let (name, email, image_url) = match row.customers {
                    Some(c) => (Some(c.name), Some(c.email), Some(c.image_url)),
                    None => (None, None, None),
                };
                LatestInvoiceRow {
                    id: row.id,
                    amount: row.amount,
                    date: row.date,
                    name,
                    email,
                    image_url,
                }
            })
            .collect())
    }

    async fn count_invoices(&self) -> Result<i64> {
        self.count("invoices").await
    }

    async fn count_customers(&self) -> Result<i64> {
        self.count("customers").await
    }

    async fn sum_invoices(&self, status: InvoiceStatus) -> Result<Cents> {
        let rows: Vec<AmountJson> = self
            .select_all(
                "invoices",
                &[
                    ("select", "amount".to_string()),
                    ("status", format!("eq.{}", status)),
                    ("order", "id.asc".to_string()),
                ],
                "invoice amounts",
            )
            .await?;

        Ok(rows.iter().map(|r| r.amount).sum())
    }

    async fn filtered_invoices(
        &self,
        search: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FilteredInvoiceRow>> {
        self.rpc(
            "fetch_filtered_invoices",
            json!({
                "search": search.trim(),
                "page_limit": limit,
                "page_offset": offset,
            }),
        )
        .await
    }

    async fn filtered_invoices_count(&self, search: &str) -> Result<i64> {
        self.rpc(
            "fetch_invoices_pages_count",
            json!({ "search": search.trim() }),
        )
        .await
    }

    async fn invoice_by_id(&self, id: InvoiceId) -> Result<Option<InvoiceDetail>> {
        let rows: Vec<InvoiceJson> = self
            .select(
                "invoices",
                &[
                    (
                        "select",
                        "id,customer_id,amount,status,date,customers(name,email,image_url)"
                            .to_string(),
                    ),
                    ("id", format!("eq.{}", id)),
                ],
                "invoice",
            )
            .await?;

        Ok(rows.into_iter().next().map(|row| {
            let customer = row.customers;
            InvoiceDetail {
                id: row.id,
                customer_id: row.customer_id,
                name: customer.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
                email: customer.as_ref().map(|c| c.email.clone()).unwrap_or_default(),
                image_url: customer.map(|c| c.image_url).unwrap_or_default(),
                amount: row.amount,
                status: row.status,
                date: row.date,
            }
        }))
    }

    async fn customers(&self) -> Result<Vec<CustomerField>> {
        self.select_all(
            "customers",
            &[
                ("select", "id,name".to_string()),
                ("order", "name.asc,id.asc".to_string()),
            ],
            "customers",
        )
        .await
    }

    async fn filtered_customers(&self, search: &str) -> Result<Vec<CustomerTotals>> {
        let mut params = vec![
            (
                "select",
                "id,name,email,image_url,invoices(amount,status)".to_string(),
            ),
            ("order", "name.asc,id.asc".to_string()),
        ];
        if !search.trim().is_empty() {
            params.push(("or", name_or_email_filter(search)));
        }

        let rows: Vec<CustomerWithInvoicesJson> =
            self.select_all("customers", &params, "filtered customers").await?;
        Ok(rows.into_iter().map(CustomerTotals::from).collect())
    }

    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceId> {
        #[derive(Deserialize)]
        struct Inserted {
            id: InvoiceId,
        }

        let request = self
            .request(Method::POST, self.table_url("invoices"))
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(invoice);
        let rows: Vec<Inserted> = self.fetch_json(request, "insert invoice").await?;

        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| anyhow::anyhow!("Insert returned no rows"))
    }

    async fn update_invoice(&self, id: InvoiceId, update: &InvoiceUpdate) -> Result<u64> {
        let body = serde_json::to_value(update).context("Failed to encode invoice update")?;
        self.write_by_id(Method::PATCH, id, Some(body)).await
    }

    async fn delete_invoice(&self, id: InvoiceId) -> Result<u64> {
        self.write_by_id(Method::DELETE, id, None).await
    }
}
