use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, format_currency};

pub type CustomerId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// Minimal customer projection used to populate select boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerField {
    pub id: CustomerId,
    pub name: String,
}

/// Customer with invoice aggregates as computed by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerTotals {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: Cents,
    pub total_paid: Cents,
}

/// Customer row ready for display, totals formatted as currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerTableRow {
    pub id: CustomerId,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}

impl From<CustomerTotals> for CustomerTableRow {
    fn from(totals: CustomerTotals) -> Self {
        Self {
            id: totals.id,
            name: totals.name,
            email: totals.email,
            image_url: totals.image_url,
            total_invoices: totals.total_invoices,
            total_pending: format_currency(totals.total_pending),
            total_paid: format_currency(totals.total_paid),
        }
    }
}

impl Customer {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            image_url: image_url.into(),
        }
    }
}
