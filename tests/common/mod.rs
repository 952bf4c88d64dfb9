// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use invoicedash::application::{MutationService, QueryService, Revalidator};
use invoicedash::domain::{
    Cents, Customer, CustomerField, CustomerTotals, Invoice, InvoiceDetail, InvoiceId,
    InvoiceStatus, FilteredInvoiceRow, InvoiceUpdate, LatestInvoiceRow, NewInvoice, Revenue,
};
use invoicedash::storage::{RemoteStore, SqliteStore};
use tempfile::TempDir;
use uuid::Uuid;

/// Helper to create a store with a temporary database
pub async fn test_store() -> Result<(Arc<SqliteStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let url = sqlite_url(&temp_dir);
    let store = SqliteStore::init(&url).await?;
    Ok((Arc::new(store), temp_dir))
}

pub fn sqlite_url(temp_dir: &TempDir) -> String {
    format!("sqlite:{}?mode=rwc", temp_dir.path().join("test.db").display())
}

pub fn query_service(store: Arc<dyn RemoteStore>) -> QueryService {
    QueryService::new(store)
}

pub fn mutation_service(
    store: Arc<dyn RemoteStore>,
) -> (MutationService, Arc<RecordingRevalidator>) {
    let revalidator = Arc::new(RecordingRevalidator::new());
    (MutationService::new(store, revalidator.clone()), revalidator)
}

/// Revalidator that keeps every path it was asked to invalidate.
#[derive(Debug, Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths invalidated so far, oldest first.
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Revalidator for RecordingRevalidator {
    fn revalidate_path(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

pub async fn add_customer(store: &SqliteStore, name: &str, email: &str) -> Result<Customer> {
    let slug = name.to_lowercase().replace(' ', "-");
    let customer = Customer::new(name, email, format!("/customers/{}.png", slug));
    store.save_customer(&customer).await?;
    Ok(customer)
}

pub async fn add_invoice(
    store: &SqliteStore,
    customer: &Customer,
    amount: Cents,
    status: InvoiceStatus,
    date: &str,
) -> Result<Invoice> {
    let invoice = Invoice {
        id: Uuid::new_v4(),
        customer_id: customer.id,
        amount,
        status,
        date: parse_date(date),
    };
    store.save_invoice(&invoice).await?;
    Ok(invoice)
}

/// Test fixture: three customers with a handful of invoices
pub struct StandardData {
    pub evil: Customer,
    pub delba: Customer,
    pub lee: Customer,
}

impl StandardData {
    pub async fn create(store: &SqliteStore) -> Result<Self> {
        let evil = add_customer(store, "Evil Rabbit", "evil@rabbit.com").await?;
        let delba = add_customer(store, "Delba de Oliveira", "delba@oliveira.com").await?;
        let lee = add_customer(store, "Lee Robinson", "lee@robinson.com").await?;

        add_invoice(store, &evil, 15795, InvoiceStatus::Pending, "2022-12-06").await?;
        add_invoice(store, &evil, 666, InvoiceStatus::Pending, "2023-06-27").await?;
        add_invoice(store, &delba, 20348, InvoiceStatus::Pending, "2022-11-14").await?;
        add_invoice(store, &delba, 500, InvoiceStatus::Paid, "2023-08-19").await?;
        add_invoice(store, &lee, 54246, InvoiceStatus::Pending, "2023-07-16").await?;
        add_invoice(store, &lee, 1000, InvoiceStatus::Paid, "2022-06-05").await?;

        Ok(Self { evil, delba, lee })
    }
}

/// Which store calls a [`FaultyStore`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    CountInvoices,
    CountCustomers,
    SumPaid,
    SumPending,
    Reads,
    Writes,
}

/// Store double that delegates to SQLite, injects failures and counts writes.
pub struct FaultyStore {
    inner: Arc<SqliteStore>,
    fault: Fault,
    writes: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteStore>, fault: Fault) -> Self {
        Self {
            inner,
            fault,
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of write calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, fault: Fault) -> Result<()> {
        if self.fault == fault {
            anyhow::bail!("injected failure: {:?}", fault);
        }
        Ok(())
    }

    fn check_read(&self) -> Result<()> {
        self.check(Fault::Reads)
    }

    fn record_write(&self) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check(Fault::Writes)
    }
}

#[async_trait]
impl RemoteStore for FaultyStore {
    fn name(&self) -> &str {
        "faulty"
    }

    async fn revenue(&self) -> Result<Vec<Revenue>> {
        self.check_read()?;
        self.inner.revenue().await
    }

    async fn latest_invoices(&self, limit: usize) -> Result<Vec<LatestInvoiceRow>> {
        self.check_read()?;
        self.inner.latest_invoices(limit).await
    }

    async fn count_invoices(&self) -> Result<i64> {
        self.check(Fault::CountInvoices)?;
        self.inner.count_invoices().await
    }

    async fn count_customers(&self) -> Result<i64> {
        self.check(Fault::CountCustomers)?;
        self.inner.count_customers().await
    }

    async fn sum_invoices(&self, status: InvoiceStatus) -> Result<Cents> {
        match status {
            InvoiceStatus::Paid => self.check(Fault::SumPaid)?,
            InvoiceStatus::Pending => self.check(Fault::SumPending)?,
        }
        self.inner.sum_invoices(status).await
    }

    async fn filtered_invoices(
        &self,
        search: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FilteredInvoiceRow>> {
        self.check_read()?;
        self.inner.filtered_invoices(search, limit, offset).await
    }

    async fn filtered_invoices_count(&self, search: &str) -> Result<i64> {
        self.check_read()?;
        self.inner.filtered_invoices_count(search).await
    }

    async fn invoice_by_id(&self, id: InvoiceId) -> Result<Option<InvoiceDetail>> {
        self.check_read()?;
        self.inner.invoice_by_id(id).await
    }

    async fn customers(&self) -> Result<Vec<CustomerField>> {
        self.check_read()?;
        self.inner.customers().await
    }

    async fn filtered_customers(&self, search: &str) -> Result<Vec<CustomerTotals>> {
        self.check_read()?;
        self.inner.filtered_customers(search).await
    }

    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceId> {
        self.record_write()?;
        self.inner.insert_invoice(invoice).await
    }

    async fn update_invoice(&self, id: InvoiceId, update: &InvoiceUpdate) -> Result<u64> {
        self.record_write()?;
        self.inner.update_invoice(id, update).await
    }

    async fn delete_invoice(&self, id: InvoiceId) -> Result<u64> {
        self.record_write()?;
        self.inner.delete_invoice(id).await
    }
}
