use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, CustomerId, format_currency};

pub type InvoiceId = Uuid;

/// Number of invoices shown per page in the invoices table.
pub const INVOICES_PER_PAGE: usize = 6;

/// Number of invoices shown in the "latest invoices" card.
pub const LATEST_INVOICES_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Issued but not settled yet
    Pending,
    /// Settled
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    /// Status values are matched exactly, as submitted by the form.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An invoice row as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    /// Amount in cents (always positive)
    pub amount: Cents,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// Validated payload for inserting a new invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewInvoice {
    pub customer_id: CustomerId,
    pub amount: Cents,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

/// Validated payload for updating an existing invoice. Id and date are not editable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceUpdate {
    pub customer_id: CustomerId,
    pub amount: Cents,
    pub status: InvoiceStatus,
}

/// Raw row for the "latest invoices" card, joined with its customer.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestInvoiceRow {
    pub id: InvoiceId,
    pub amount: Cents,
    pub date: NaiveDate,
    pub name: Option<String>,
    pub email: Option<String>,
    pub image_url: Option<String>,
}

/// Latest invoice ready for display, amount formatted as currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestInvoice {
    pub id: InvoiceId,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub amount: String,
}

/// Row returned by the invoice search, joined with its customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredInvoiceRow {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub date: NaiveDate,
    pub amount: Cents,
    pub status: InvoiceStatus,
}

/// One row of the invoices table, amount formatted as currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceTableRow {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub date: NaiveDate,
    pub amount: String,
    pub status: InvoiceStatus,
}

impl From<FilteredInvoiceRow> for InvoiceTableRow {
    fn from(row: FilteredInvoiceRow) -> Self {
        Self {
            amount: format_currency(row.amount),
            id: row.id,
            customer_id: row.customer_id,
            name: row.name,
            email: row.email,
            image_url: row.image_url,
            date: row.date,
            status: row.status,
        }
    }
}

/// A single invoice with its customer fields resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDetail {
    pub id: InvoiceId,
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub amount: Cents,
    pub status: InvoiceStatus,
    pub date: NaiveDate,
}

impl Invoice {
    pub fn from_new(new: NewInvoice) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id: new.customer_id,
            amount: new.amount,
            status: new.status,
            date: new.date,
        }
    }
}

/// Number of pages needed to show `total_rows` invoices.
pub fn total_pages(total_rows: i64) -> u32 {
    if total_rows <= 0 {
        return 0;
    }
    let per_page = INVOICES_PER_PAGE as i64;
    ((total_rows + per_page - 1) / per_page) as u32
}

/// Row offset of a 1-based page. Page 0 is treated as the first page.
pub fn page_offset(page: u32) -> usize {
    (page.max(1) as usize - 1) * INVOICES_PER_PAGE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [InvoiceStatus::Pending, InvoiceStatus::Paid] {
            assert_eq!(InvoiceStatus::from_str(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_rejects_unknown_values() {
        assert_eq!(InvoiceStatus::from_str(""), None);
        assert_eq!(InvoiceStatus::from_str("overdue"), None);
        assert_eq!(InvoiceStatus::from_str("PAID"), None);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(6), 1);
        assert_eq!(total_pages(7), 2);
        assert_eq!(total_pages(13), 3);
        for rows in 0..100 {
            assert!(total_pages(rows) as i64 * INVOICES_PER_PAGE as i64 >= rows);
        }
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(0), 0);
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), 6);
        assert_eq!(page_offset(4), 18);
    }
}
