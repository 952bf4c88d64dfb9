mod rest;
mod seed;
mod sqlite;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{StoreConfig, StoreKind};
use crate::domain::{
    Cents, CustomerField, CustomerTotals, InvoiceDetail, InvoiceId, InvoiceStatus,
    FilteredInvoiceRow, InvoiceUpdate, LatestInvoiceRow, NewInvoice, Revenue,
};

pub use rest::*;
pub use seed::*;
pub use sqlite::*;

/// SQL schema for the local store
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// Query and write interface of the backing store.
///
/// Adapters hide transport, auth and query execution. Every call is a fresh
/// round trip; nothing is cached.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Adapter name, used in logs.
    fn name(&self) -> &str;

    async fn revenue(&self) -> Result<Vec<Revenue>>;

    /// Most recent invoices by date, joined with their customer.
    async fn latest_invoices(&self, limit: usize) -> Result<Vec<LatestInvoiceRow>>;

    async fn count_invoices(&self) -> Result<i64>;

    async fn count_customers(&self) -> Result<i64>;

    async fn sum_invoices(&self, status: InvoiceStatus) -> Result<Cents>;

    /// Procedure `fetch_filtered_invoices`: invoices whose customer name or
    /// email contains `search`, newest first.
    async fn filtered_invoices(
        &self,
        search: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FilteredInvoiceRow>>;

    /// Procedure `fetch_invoices_pages_count`: number of rows matched by
    /// the same filter as [`RemoteStore::filtered_invoices`].
    async fn filtered_invoices_count(&self, search: &str) -> Result<i64>;

    async fn invoice_by_id(&self, id: InvoiceId) -> Result<Option<InvoiceDetail>>;

    /// All customers ordered by name.
    async fn customers(&self) -> Result<Vec<CustomerField>>;

    async fn filtered_customers(&self, search: &str) -> Result<Vec<CustomerTotals>>;

    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceId>;

    /// Returns the number of rows updated.
    async fn update_invoice(&self, id: InvoiceId, update: &InvoiceUpdate) -> Result<u64>;

    /// Returns the number of rows deleted.
    async fn delete_invoice(&self, id: InvoiceId) -> Result<u64>;
}

/// Open the store selected by the URL scheme of `config`.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn RemoteStore>> {
    match config.kind()? {
        StoreKind::Sqlite => Ok(Arc::new(SqliteStore::connect(&config.url).await?)),
        StoreKind::Rest => Ok(Arc::new(RestStore::new(&config.url, &config.key)?)),
    }
}

/// Escape `%`, `_` and `\` so the search text is matched literally inside a
/// LIKE pattern using `\` as the escape character.
pub fn escape_like(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len());
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substring LIKE pattern for a search box value.
pub fn contains_pattern(search: &str) -> String {
    format!("%{}%", escape_like(search.trim()))
}
