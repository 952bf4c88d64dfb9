use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

use crate::application::QueryService;
use crate::domain::{CustomerTableRow, InvoiceTableRow};

/// Dashboard snapshot for JSON export
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub query: String,
    pub invoices: Vec<InvoiceTableRow>,
    pub customers: Vec<CustomerTableRow>,
}

/// Exporter for writing dashboard data to CSV or JSON
pub struct Exporter<'a> {
    service: &'a QueryService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a QueryService) -> Self {
        Self { service }
    }

    /// Every invoice matching `query`, walking all pages in order.
    async fn all_invoices(&self, query: &str) -> Result<Vec<InvoiceTableRow>> {
        let total_pages = self.service.fetch_invoices_pages(query).await?;
        let mut invoices = Vec::new();
        for page in 1..=total_pages {
            invoices.extend(self.service.fetch_filtered_invoices(query, page).await?);
        }
        Ok(invoices)
    }

    /// Export invoices matching `query` to CSV format
    pub async fn export_invoices_csv<W: Write>(&self, query: &str, writer: W) -> Result<usize> {
        let invoices = self.all_invoices(query).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "customer",
            "email",
            "amount",
            "status",
        ])?;

        for invoice in &invoices {
            csv_writer.write_record([
                invoice.id.to_string(),
                invoice.date.to_string(),
                invoice.name.clone(),
                invoice.email.clone(),
                invoice.amount.clone(),
                invoice.status.as_str().to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(invoices.len())
    }

    /// Export customers matching `query` to CSV format
    pub async fn export_customers_csv<W: Write>(&self, query: &str, writer: W) -> Result<usize> {
        let customers = self.service.fetch_filtered_customers(query).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "name",
            "email",
            "total_invoices",
            "total_pending",
            "total_paid",
        ])?;

        for customer in &customers {
            csv_writer.write_record([
                customer.id.to_string(),
                customer.name.clone(),
                customer.email.clone(),
                customer.total_invoices.to_string(),
                customer.total_pending.clone(),
                customer.total_paid.clone(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(customers.len())
    }

    /// Export invoices and customers matching `query` as one JSON document
    pub async fn export_json<W: Write>(
        &self,
        query: &str,
        mut writer: W,
    ) -> Result<DashboardSnapshot> {
        let invoices = self.all_invoices(query).await?;
        let customers = self.service.fetch_filtered_customers(query).await?;

        let snapshot = DashboardSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            query: query.to_string(),
            invoices,
            customers,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
