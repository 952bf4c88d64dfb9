use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Cents, Customer, CustomerField, CustomerTotals, Invoice, InvoiceDetail, InvoiceId,
    InvoiceStatus, FilteredInvoiceRow, InvoiceUpdate, LatestInvoiceRow, NewInvoice, Revenue,
};

use super::{MIGRATION_001_INITIAL, RemoteStore, contains_pattern};

/// Store backed by a SQLite database.
///
/// The two search procedures run as SQL inside the database, so matching
/// and pagination are evaluated next to the data.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a new store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create the schema if it does not exist yet.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let store = Self::connect(database_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    // ========================
    // Reference data
    // ========================

    /// Save a new customer.
    pub async fn save_customer(&self, customer: &Customer) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, image_url)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(customer.id.to_string())
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.image_url)
        .execute(&self.pool)
        .await
        .context("Failed to save customer")?;
        Ok(())
    }

    /// Save a full invoice row, keeping its id.
    pub async fn save_invoice(&self, invoice: &Invoice) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, customer_id, amount, status, date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(invoice.id.to_string())
        .bind(invoice.customer_id.to_string())
        .bind(invoice.amount)
        .bind(invoice.status.as_str())
        .bind(invoice.date.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to save invoice")?;
        Ok(())
    }

    /// Save one month of revenue, replacing an existing entry for that month.
    pub async fn save_revenue(&self, revenue: &Revenue) -> Result<()> {
        sqlx::query("INSERT OR REPLACE INTO revenue (month, revenue) VALUES (?, ?)")
            .bind(&revenue.month)
            .bind(revenue.revenue)
            .execute(&self.pool)
            .await
            .context("Failed to save revenue")?;
        Ok(())
    }

    fn parse_date(value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .with_context(|| format!("Invalid invoice date: {}", value))
    }

    fn parse_status(value: &str) -> Result<InvoiceStatus> {
        InvoiceStatus::from_str(value)
            .ok_or_else(|| anyhow::anyhow!("Invalid invoice status: {}", value))
    }

    fn row_to_table_row(row: &sqlx::sqlite::SqliteRow) -> Result<FilteredInvoiceRow> {
        let id_str: String = row.get("id");
        let customer_id_str: String = row.get("customer_id");
        let date_str: String = row.get("date");
        let status_str: String = row.get("status");

        Ok(FilteredInvoiceRow {
            id: Uuid::parse_str(&id_str).context("Invalid invoice ID")?,
            customer_id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
            name: row.get("name"),
            email: row.get("email"),
            image_url: row.get("image_url"),
            date: Self::parse_date(&date_str)?,
            amount: row.get("amount"),
            status: Self::parse_status(&status_str)?,
        })
    }

    fn row_to_detail(row: &sqlx::sqlite::SqliteRow) -> Result<InvoiceDetail> {
        let id_str: String = row.get("id");
        let customer_id_str: String = row.get("customer_id");
        let date_str: String = row.get("date");
        let status_str: String = row.get("status");

        Ok(InvoiceDetail {
            id: Uuid::parse_str(&id_str).context("Invalid invoice ID")?,
            customer_id: Uuid::parse_str(&customer_id_str).context("Invalid customer ID")?,
            name: row.get::<Option<String>, _>("name").unwrap_or_default(),
            email: row.get::<Option<String>, _>("email").unwrap_or_default(),
            image_url: row.get::<Option<String>, _>("image_url").unwrap_or_default(),
            amount: row.get("amount"),
            status: Self::parse_status(&status_str)?,
            date: Self::parse_date(&date_str)?,
        })
    }

    fn row_to_customer_totals(row: &sqlx::sqlite::SqliteRow) -> Result<CustomerTotals> {
        let id_str: String = row.get("id");

        Ok(CustomerTotals {
            id: Uuid::parse_str(&id_str).context("Invalid customer ID")?,
            name: row.get("name"),
            email: row.get("email"),
            image_url: row.get("image_url"),
            total_invoices: row.get("total_invoices"),
            total_pending: row.get("total_pending"),
            total_paid: row.get("total_paid"),
        })
    }
}

#[async_trait]
impl RemoteStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn revenue(&self) -> Result<Vec<Revenue>> {
        let rows = sqlx::query("SELECT month, revenue FROM revenue ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch revenue")?;

        Ok(rows
            .iter()
            .map(|row| Revenue {
                month: row.get("month"),
                revenue: row.get("revenue"),
            })
            .collect())
    }

    async fn latest_invoices(&self, limit: usize) -> Result<Vec<LatestInvoiceRow>> {
        let rows = sqlx::query(
            r#"
            SELECT i.id, i.amount, i.date, c.name, c.email, c.image_url
            FROM invoices i
            LEFT JOIN customers c ON c.id = i.customer_id
            ORDER BY i.date DESC, i.id
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch latest invoices")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                let date_str: String = row.get("date");
                Ok(LatestInvoiceRow {
                    id: Uuid::parse_str(&id_str).context("Invalid invoice ID")?,
                    amount: row.get("amount"),
                    date: Self::parse_date(&date_str)?,
                    name: row.get("name"),
                    email: row.get("email"),
                    image_url: row.get("image_url"),
                })
            })
            .collect()
    }

    async fn count_invoices(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM invoices")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count invoices")?;
        Ok(row.get("count"))
    }

    async fn count_customers(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM customers")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count customers")?;
        Ok(row.get("count"))
    }

    async fn sum_invoices(&self, status: InvoiceStatus) -> Result<Cents> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(amount), 0) as total
            FROM invoices
            WHERE status = ?
            "#,
        )
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to sum {} invoices", status))?;

        Ok(row.get("total"))
    }

    async fn filtered_invoices(
        &self,
        search: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<FilteredInvoiceRow>> {
        let pattern = contains_pattern(search);

        let rows = sqlx::query(
            r#"
            SELECT i.id, i.customer_id, i.amount, i.date, i.status, c.name, c.email, c.image_url
            FROM invoices i
            JOIN customers c ON c.id = i.customer_id
            WHERE c.name LIKE ? ESCAPE '\' OR c.email LIKE ? ESCAPE '\'
            ORDER BY i.date DESC, i.id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch filtered invoices")?;

        rows.iter().map(Self::row_to_table_row).collect()
    }

    async fn filtered_invoices_count(&self, search: &str) -> Result<i64> {
        let pattern = contains_pattern(search);

        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM invoices i
            JOIN customers c ON c.id = i.customer_id
            WHERE c.name LIKE ? ESCAPE '\' OR c.email LIKE ? ESCAPE '\'
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count filtered invoices")?;

        Ok(row.get("count"))
    }

    async fn invoice_by_id(&self, id: InvoiceId) -> Result<Option<InvoiceDetail>> {
        let row = sqlx::query(
            r#"
            SELECT i.id, i.customer_id, i.amount, i.status, i.date, c.name, c.email, c.image_url
            FROM invoices i
            LEFT JOIN customers c ON c.id = i.customer_id
            WHERE i.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch invoice")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_detail(&row)?)),
            None => Ok(None),
        }
    }

    async fn customers(&self) -> Result<Vec<CustomerField>> {
        let rows = sqlx::query("SELECT id, name FROM customers ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list customers")?;

        rows.iter()
            .map(|row| {
                let id_str: String = row.get("id");
                Ok(CustomerField {
                    id: Uuid::parse_str(&id_str).context("Invalid customer ID")?,
                    name: row.get("name"),
                })
            })
            .collect()
    }

    async fn filtered_customers(&self, search: &str) -> Result<Vec<CustomerTotals>> {
        let pattern = contains_pattern(search);

        let rows = sqlx::query(
            r#"
            SELECT
                c.id,
                c.name,
                c.email,
                c.image_url,
                COUNT(i.id) as total_invoices,
                COALESCE(SUM(CASE WHEN i.status = 'pending' THEN i.amount ELSE 0 END), 0) as total_pending,
                COALESCE(SUM(CASE WHEN i.status = 'paid' THEN i.amount ELSE 0 END), 0) as total_paid
            FROM customers c
            LEFT JOIN invoices i ON i.customer_id = c.id
            WHERE c.name LIKE ? ESCAPE '\' OR c.email LIKE ? ESCAPE '\'
            GROUP BY c.id, c.name, c.email, c.image_url
            ORDER BY c.name
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch filtered customers")?;

        rows.iter().map(Self::row_to_customer_totals).collect()
    }

    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceId> {
        let invoice = Invoice::from_new(invoice.clone());
        self.save_invoice(&invoice).await?;
        Ok(invoice.id)
    }

    async fn update_invoice(&self, id: InvoiceId, update: &InvoiceUpdate) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET customer_id = ?, amount = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(update.customer_id.to_string())
        .bind(update.amount)
        .bind(update.status.as_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to update invoice")?;

        Ok(result.rows_affected())
    }

    async fn delete_invoice(&self, id: InvoiceId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete invoice")?;

        Ok(result.rows_affected())
    }
}
