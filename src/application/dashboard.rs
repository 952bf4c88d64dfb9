use serde::Serialize;

use crate::domain::{Cents, InvoiceTableRow, PageItem, format_currency, generate_pagination};

/// Aggregates shown on the dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardData {
    pub number_of_invoices: i64,
    pub number_of_customers: i64,
    pub total_paid_invoices: String,
    pub total_pending_invoices: String,
}

impl CardData {
    pub fn new(
        number_of_invoices: i64,
        number_of_customers: i64,
        total_paid: Cents,
        total_pending: Cents,
    ) -> Self {
        Self {
            number_of_invoices,
            number_of_customers,
            total_paid_invoices: format_currency(total_paid),
            total_pending_invoices: format_currency(total_pending),
        }
    }
}

/// One page of the invoices table together with its pagination bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicesPage {
    pub query: String,
    pub current_page: u32,
    pub total_pages: u32,
    pub invoices: Vec<InvoiceTableRow>,
    pub pagination: Vec<PageItem>,
}

impl InvoicesPage {
    pub fn new(
        query: impl Into<String>,
        current_page: u32,
        total_pages: u32,
        invoices: Vec<InvoiceTableRow>,
    ) -> Self {
        Self {
            query: query.into(),
            current_page,
            total_pages,
            pagination: generate_pagination(current_page, total_pages),
            invoices,
        }
    }
}
