use anyhow::Result;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Customer, Invoice, InvoiceStatus, Revenue};

use super::SqliteStore;

/// Sample data for a fresh local database.
pub struct SeedData {
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub revenue: Vec<Revenue>,
}

/// Totals of what a seed run inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub customers: usize,
    pub invoices: usize,
    pub revenue: usize,
}

impl SeedData {
    /// Six customers, thirteen invoices and a year of revenue.
    pub fn sample() -> Self {
        let customers = vec![
            Customer::new("Evil Rabbit", "evil@rabbit.com", "/customers/evil-rabbit.png"),
            Customer::new(
                "Delba de Oliveira",
                "delba@oliveira.com",
                "/customers/delba-de-oliveira.png",
            ),
            Customer::new("Lee Robinson", "lee@robinson.com", "/customers/lee-robinson.png"),
            Customer::new(
                "Michael Novotny",
                "michael@novotny.com",
                "/customers/michael-novotny.png",
            ),
            Customer::new("Amy Burns", "amy@burns.com", "/customers/amy-burns.png"),
            Customer::new("Balazs Orban", "balazs@orban.com", "/customers/balazs-orban.png"),
        ];

        use InvoiceStatus::{Paid, Pending};
        let rows: [(usize, i64, InvoiceStatus, (i32, u32, u32)); 13] = [
            (0, 15795, Pending, (2022, 12, 6)),
            (1, 20348, Pending, (2022, 11, 14)),
            (4, 3040, Paid, (2022, 10, 29)),
            (3, 44800, Paid, (2023, 9, 10)),
            (5, 34577, Pending, (2023, 8, 5)),
            (2, 54246, Pending, (2023, 7, 16)),
            (0, 666, Pending, (2023, 6, 27)),
            (3, 32545, Paid, (2023, 6, 9)),
            (4, 1250, Paid, (2023, 6, 17)),
            (5, 8546, Paid, (2023, 6, 7)),
            (1, 500, Paid, (2023, 8, 19)),
            (5, 8945, Paid, (2023, 6, 3)),
            (2, 1000, Paid, (2022, 6, 5)),
        ];

        let invoices = rows
            .iter()
            .filter_map(|&(customer, amount, status, (y, m, d))| {
                Some(Invoice {
                    id: Uuid::new_v4(),
                    customer_id: customers[customer].id,
                    amount,
                    status,
                    date: NaiveDate::from_ymd_opt(y, m, d)?,
                })
            })
            .collect();

        let revenue = [
            ("Jan", 2000),
            ("Feb", 1800),
            ("Mar", 2200),
            ("Apr", 2500),
            ("May", 2300),
            ("Jun", 3200),
            ("Jul", 3500),
            ("Aug", 3700),
            ("Sep", 2500),
            ("Oct", 2800),
            ("Nov", 3000),
            ("Dec", 4800),
        ]
        .into_iter()
        .map(|(month, amount)| Revenue::new(month, amount))
        .collect();

        Self {
            customers,
            invoices,
            revenue,
        }
    }
}

impl SqliteStore {
    /// Insert the given seed data.
    pub async fn seed(&self, data: &SeedData) -> Result<SeedSummary> {
        for customer in &data.customers {
            self.save_customer(customer).await?;
        }
        for invoice in &data.invoices {
            self.save_invoice(invoice).await?;
        }
        for revenue in &data.revenue {
            self.save_revenue(revenue).await?;
        }

        tracing::info!(
            customers = data.customers.len(),
            invoices = data.invoices.len(),
            revenue = data.revenue.len(),
            "Seeded database"
        );

        Ok(SeedSummary {
            customers: data.customers.len(),
            invoices: data.invoices.len(),
            revenue: data.revenue.len(),
        })
    }
}
