use std::sync::Arc;

use tracing::debug;

use crate::config::StoreConfig;
use crate::domain::{
    CustomerField, CustomerTableRow, INVOICES_PER_PAGE, InvoiceDetail, InvoiceId, InvoiceStatus,
    InvoiceTableRow, LATEST_INVOICES_LIMIT, LatestInvoice, Revenue, format_currency, page_offset,
    total_pages,
};
use crate::storage::{self, RemoteStore};

use super::{AppError, CardData, InvoicesPage};

/// Read-only accessors behind the dashboard views.
///
/// Every call goes to the store; nothing is cached between calls.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn RemoteStore>,
}

impl QueryService {
    /// Create a query service over an existing store handle.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Open the store described by `config`.
    pub async fn connect(config: &StoreConfig) -> Result<Self, AppError> {
        config.kind()?;
        Ok(Self::new(storage::connect(config).await?))
    }

    pub async fn fetch_revenue(&self) -> Result<Vec<Revenue>, AppError> {
        debug!(store = self.store.name(), "Fetching revenue data");
        self.store
            .revenue()
            .await
            .map_err(AppError::fetch("revenue data"))
    }

    /// The five most recent invoices, newest first.
    pub async fn fetch_latest_invoices(&self) -> Result<Vec<LatestInvoice>, AppError> {
        let rows = self
            .store
            .latest_invoices(LATEST_INVOICES_LIMIT)
            .await
            .map_err(AppError::fetch("the latest invoices"))?;

        Ok(rows
            .into_iter()
            .map(|row| LatestInvoice {
                id: row.id,
                name: row.name.unwrap_or_default(),
                email: row.email.unwrap_or_default(),
                image_url: row.image_url.unwrap_or_default(),
                amount: format_currency(row.amount),
            })
            .collect())
    }

    /// Card aggregates. The four queries run concurrently and the first
    /// failure fails the whole call.
    pub async fn fetch_card_data(&self) -> Result<CardData, AppError> {
        let store = self.store.as_ref();
        let (invoice_count, customer_count, total_paid, total_pending) = tokio::try_join!(
            store.count_invoices(),
            store.count_customers(),
            store.sum_invoices(InvoiceStatus::Paid),
            store.sum_invoices(InvoiceStatus::Pending),
        )
        .map_err(AppError::fetch("card data"))?;

        Ok(CardData::new(
            invoice_count,
            customer_count,
            total_paid,
            total_pending,
        ))
    }

    /// One page of invoices whose customer name or email contains `query`,
    /// case-insensitively. Pages start at 1; page 0 is read as page 1.
    pub async fn fetch_filtered_invoices(
        &self,
        query: &str,
        current_page: u32,
    ) -> Result<Vec<InvoiceTableRow>, AppError> {
        let offset = page_offset(current_page);
        debug!(query, current_page, offset, "Fetching filtered invoices");

        let rows = self
            .store
            .filtered_invoices(query, INVOICES_PER_PAGE, offset)
            .await
            .map_err(AppError::fetch("invoices"))?;

        Ok(rows.into_iter().map(InvoiceTableRow::from).collect())
    }

    /// Number of pages needed to list every invoice matching `query`.
    pub async fn fetch_invoices_pages(&self, query: &str) -> Result<u32, AppError> {
        let count = self
            .store
            .filtered_invoices_count(query)
            .await
            .map_err(AppError::fetch("total number of invoices"))?;

        Ok(total_pages(count))
    }

    /// Page of invoices plus the page count and pagination bar.
    pub async fn fetch_invoices_page(
        &self,
        query: &str,
        current_page: u32,
    ) -> Result<InvoicesPage, AppError> {
        let current_page = current_page.max(1);
        let (invoices, total_pages) = tokio::try_join!(
            self.fetch_filtered_invoices(query, current_page),
            self.fetch_invoices_pages(query),
        )?;

        Ok(InvoicesPage::new(query, current_page, total_pages, invoices))
    }

    pub async fn fetch_invoice_by_id(&self, id: InvoiceId) -> Result<InvoiceDetail, AppError> {
        self.store
            .invoice_by_id(id)
            .await
            .map_err(AppError::fetch("invoice"))?
            .ok_or(AppError::InvoiceNotFound(id))
    }

    /// All customers, id and name only, ordered by name.
    pub async fn fetch_customers(&self) -> Result<Vec<CustomerField>, AppError> {
        self.store
            .customers()
            .await
            .map_err(AppError::fetch("all customers"))
    }

    /// Customers whose name or email contains `query`, with their invoice totals.
    pub async fn fetch_filtered_customers(
        &self,
        query: &str,
    ) -> Result<Vec<CustomerTableRow>, AppError> {
        let customers = self
            .store
            .filtered_customers(query)
            .await
            .map_err(AppError::fetch("customer table"))?;

        Ok(customers.into_iter().map(CustomerTableRow::from).collect())
    }
}
