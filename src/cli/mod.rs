use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::{
    AMOUNT_FIELD, CUSTOMER_ID_FIELD, FormData, LogRevalidator, MutationOutcome, MutationService,
    QueryService, STATUS_FIELD,
};
use crate::config::{STORE_KEY_VAR, STORE_URL_VAR, StoreConfig, StoreKind};
use crate::domain::{format_currency, format_date_to_local, generate_y_axis};
use crate::storage::{self, SeedData, SqliteStore};

/// invoicedash - Invoice dashboard
#[derive(Parser)]
#[command(name = "invoicedash")]
#[command(about = "Revenue, invoices and customers from the command line")]
#[command(version)]
pub struct Cli {
    /// Store URL: sqlite:<path> for a local database, https://... for a hosted backend
    #[arg(long, global = true, env = STORE_URL_VAR)]
    pub store_url: Option<String>,

    /// Store access key
    #[arg(long, global = true, env = STORE_KEY_VAR, hide_env_values = true)]
    pub store_key: Option<String>,

    /// Output format: table, json
    #[arg(long, global = true, default_value = "table")]
    pub format: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the local database schema
    Init {
        /// Insert sample customers, invoices and revenue
        #[arg(long)]
        seed: bool,
    },

    /// Show monthly revenue
    Revenue,

    /// Show the five most recent invoices
    Latest,

    /// Show the dashboard cards
    Cards,

    /// Search invoices by customer name or email
    Invoices {
        /// Search text (case-insensitive substring)
        #[arg(short, long, default_value = "")]
        query: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show a single invoice
    #[command(name = "show")]
    ShowInvoice {
        /// Invoice ID
        id: String,
    },

    /// List customers; with --query, search them and show invoice totals
    Customers {
        /// Search text (case-insensitive substring)
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Create an invoice
    Create {
        /// Customer ID
        #[arg(long)]
        customer_id: Option<String>,

        /// Amount in dollars (e.g., "50.00" or "50")
        #[arg(short, long)]
        amount: Option<String>,

        /// Status: pending, paid
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Update an invoice
    Update {
        /// Invoice ID
        id: String,

        /// Customer ID
        #[arg(long)]
        customer_id: Option<String>,

        /// Amount in dollars (e.g., "50.00" or "50")
        #[arg(short, long)]
        amount: Option<String>,

        /// Status: pending, paid
        #[arg(short, long)]
        status: Option<String>,
    },

    /// Delete an invoice
    Delete {
        /// Invoice ID
        id: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: invoices, customers, full
        export_type: String,

        /// Only rows whose customer name or email contains this text
        #[arg(short, long, default_value = "")]
        query: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

impl Cli {
    fn store_config(&self) -> Result<StoreConfig> {
        Ok(StoreConfig::new(
            self.store_url.clone().unwrap_or_default(),
            self.store_key.clone().unwrap_or_default(),
        )?)
    }

    fn json(&self) -> bool {
        self.format == "json"
    }

    pub async fn run(self) -> Result<()> {
        let config = self.store_config()?;

        if let Commands::Init { seed } = self.command {
            return run_init_command(&config, seed).await;
        }

        let store = storage::connect(&config).await?;
        let queries = QueryService::new(store.clone());
        let mutations = MutationService::new(store, Arc::new(LogRevalidator));

        match &self.command {
            Commands::Init { .. } => unreachable!("handled above"),

            Commands::Revenue => run_revenue_command(&queries, self.json()).await?,

            Commands::Latest => run_latest_command(&queries, self.json()).await?,

            Commands::Cards => {
                let cards = queries.fetch_card_data().await?;
                if self.json() {
                    println!("{}", serde_json::to_string_pretty(&cards)?);
                } else {
                    println!("Collected: {:>14}", cards.total_paid_invoices);
                    println!("Pending:   {:>14}", cards.total_pending_invoices);
                    println!("Invoices:  {:>14}", cards.number_of_invoices);
                    println!("Customers: {:>14}", cards.number_of_customers);
                }
            }

            Commands::Invoices { query, page } => {
                run_invoices_command(&queries, query, *page, self.json()).await?
            }

            Commands::ShowInvoice { id } => {
                let invoice = queries.fetch_invoice_by_id(parse_invoice_id(id)?).await?;
                if self.json() {
                    println!("{}", serde_json::to_string_pretty(&invoice)?);
                } else {
                    println!("Invoice: {}", invoice.id);
                    println!("  Customer: {} <{}>", invoice.name, invoice.email);
                    println!("  Customer ID: {}", invoice.customer_id);
                    println!("  Amount:   {}", format_currency(invoice.amount));
                    println!("  Status:   {}", invoice.status);
                    println!("  Date:     {}", format_date_to_local(invoice.date));
                }
            }

            Commands::Customers { query } => {
                run_customers_command(&queries, query.as_deref(), self.json()).await?
            }

            Commands::Create {
                customer_id,
                amount,
                status,
            } => {
                let form = invoice_form(customer_id, amount, status);
                let outcome = mutations.create_invoice(&form).await;
                report_outcome(&outcome, "Created invoice", self.json())?;
            }

            Commands::Update {
                id,
                customer_id,
                amount,
                status,
            } => {
                let form = invoice_form(customer_id, amount, status);
                let outcome = mutations
                    .update_invoice(parse_invoice_id(id)?, &form)
                    .await;
                report_outcome(&outcome, "Updated invoice", self.json())?;
            }

            Commands::Delete { id } => {
                let outcome = mutations.delete_invoice(parse_invoice_id(id)?).await;
                report_outcome(&outcome, "Deleted invoice", self.json())?;
            }

            Commands::Export {
                export_type,
                query,
                output,
            } => {
                run_export_command(&queries, export_type, query, output.as_deref()).await?
            }
        }

        Ok(())
    }
}

async fn run_init_command(config: &StoreConfig, seed: bool) -> Result<()> {
    if config.kind()? != StoreKind::Sqlite {
        anyhow::bail!("init only manages local sqlite: databases");
    }

    let url = if config.url.contains("mode=") {
        config.url.clone()
    } else if config.url.contains('?') {
        format!("{}&mode=rwc", config.url)
    } else {
        format!("{}?mode=rwc", config.url)
    };

    let store = SqliteStore::init(&url).await?;
    println!("Database initialized: {}", config.url);

    if seed {
        let summary = store.seed(&SeedData::sample()).await?;
        println!(
            "Seeded {} customers, {} invoices, {} months of revenue",
            summary.customers, summary.invoices, summary.revenue
        );
    }
    Ok(())
}

async fn run_revenue_command(queries: &QueryService, json: bool) -> Result<()> {
    let revenue = queries.fetch_revenue().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&revenue)?);
        return Ok(());
    }

    if revenue.is_empty() {
        println!("No data available.");
        return Ok(());
    }

    let axis = generate_y_axis(&revenue);
    println!("Recent Revenue (axis: {} to $0K)", axis.labels[0]);
    println!("{}", "-".repeat(50));
    for month in &revenue {
        let width = if axis.top_label > 0 {
            (i128::from(month.revenue.max(0)) * 30 / i128::from(axis.top_label)) as usize
        } else {
            0
        };
        println!(
            "{:<5} {:>8} {}",
            month.month,
            format_currency(month.revenue.saturating_mul(100)),
            "#".repeat(width)
        );
    }
    Ok(())
}

async fn run_latest_command(queries: &QueryService, json: bool) -> Result<()> {
    let invoices = queries.fetch_latest_invoices().await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&invoices)?);
        return Ok(());
    }

    if invoices.is_empty() {
        println!("No invoices found.");
        return Ok(());
    }

    println!("{:<22} {:<28} {:>12}", "CUSTOMER", "EMAIL", "AMOUNT");
    println!("{}", "-".repeat(64));
    for invoice in &invoices {
        println!(
            "{:<22} {:<28} {:>12}",
            truncate(&invoice.name, 22),
            truncate(&invoice.email, 28),
            invoice.amount
        );
    }
    Ok(())
}

async fn run_invoices_command(
    queries: &QueryService,
    query: &str,
    page: u32,
    json: bool,
) -> Result<()> {
    let page = queries.fetch_invoices_page(query, page).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.invoices.is_empty() {
        println!("No invoices found.");
    } else {
        println!(
            "{:<20} {:<26} {:>12} {:<14} {:<8} ID",
            "CUSTOMER", "EMAIL", "AMOUNT", "DATE", "STATUS"
        );
        println!("{}", "-".repeat(120));
        for invoice in &page.invoices {
            println!(
                "{:<20} {:<26} {:>12} {:<14} {:<8} {}",
                truncate(&invoice.name, 20),
                truncate(&invoice.email, 26),
                invoice.amount,
                format_date_to_local(invoice.date),
                invoice.status,
                invoice.id
            );
        }
    }

    if page.total_pages > 0 {
        let bar: Vec<String> = page
            .pagination
            .iter()
            .map(|item| match item {
                crate::domain::PageItem::Page(n) if *n == page.current_page => format!("[{}]", n),
                other => other.to_string(),
            })
            .collect();
        println!();
        println!("Page {} of {}: {}", page.current_page, page.total_pages, bar.join(" "));
    }
    Ok(())
}

async fn run_customers_command(
    queries: &QueryService,
    query: Option<&str>,
    json: bool,
) -> Result<()> {
    let Some(query) = query else {
        let customers = queries.fetch_customers().await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&customers)?);
        } else if customers.is_empty() {
            println!("No customers found.");
        } else {
            println!("{:<24} ID", "NAME");
            println!("{}", "-".repeat(62));
            for customer in &customers {
                println!("{:<24} {}", truncate(&customer.name, 24), customer.id);
            }
        }
        return Ok(());
    };

    let customers = queries.fetch_filtered_customers(query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&customers)?);
    } else if customers.is_empty() {
        println!("No customers found.");
    } else {
        println!(
            "{:<22} {:<26} {:>8} {:>12} {:>12}",
            "NAME", "EMAIL", "INVOICES", "PENDING", "PAID"
        );
        println!("{}", "-".repeat(84));
        for customer in &customers {
            println!(
                "{:<22} {:<26} {:>8} {:>12} {:>12}",
                truncate(&customer.name, 22),
                truncate(&customer.email, 26),
                customer.total_invoices,
                customer.total_pending,
                customer.total_paid
            );
        }
    }
    Ok(())
}

async fn run_export_command(
    queries: &QueryService,
    export_type: &str,
    query: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(queries);
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create {}", path))?,
        ),
        None => Box::new(stdout()),
    };

    let count = match export_type {
        "invoices" => exporter.export_invoices_csv(query, writer).await?,
        "customers" => exporter.export_customers_csv(query, writer).await?,
        "full" => {
            let snapshot = exporter.export_json(query, writer).await?;
            snapshot.invoices.len() + snapshot.customers.len()
        }
        other => anyhow::bail!(
            "Unknown export type '{}'. Valid types: invoices, customers, full",
            other
        ),
    };

    if let Some(path) = output {
        eprintln!("Exported {} records to {}", count, path);
    }
    Ok(())
}

fn invoice_form(
    customer_id: &Option<String>,
    amount: &Option<String>,
    status: &Option<String>,
) -> FormData {
    let fields = [
        (CUSTOMER_ID_FIELD, customer_id),
        (AMOUNT_FIELD, amount),
        (STATUS_FIELD, status),
    ];
    FormData::from_pairs(
        fields
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v))),
    )
}

fn report_outcome(outcome: &MutationOutcome, done: &str, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    }

    match outcome {
        MutationOutcome::Success { message, redirect } => {
            if !json {
                println!("{}", message.as_deref().unwrap_or(done));
                if let Some(path) = redirect {
                    println!("Next: {}", path);
                }
            }
            Ok(())
        }
        MutationOutcome::Failure(state) => {
            if !json {
                for (field, messages) in &state.errors {
                    for message in messages {
                        eprintln!("  {}: {}", field, message);
                    }
                }
            }
            anyhow::bail!(
                "{}",
                state.message.as_deref().unwrap_or("Mutation failed.")
            )
        }
    }
}

fn parse_invoice_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).context("Invalid invoice ID format (expected UUID)")
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
