mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{
    Fault, FaultyStore, StandardData, add_customer, add_invoice, query_service, sqlite_url,
    test_store,
};
use invoicedash::StoreConfig;
use invoicedash::application::{AppError, MutationService, QueryService};
use invoicedash::config::ConfigError;
use invoicedash::domain::{INVOICES_PER_PAGE, InvoiceStatus, PageItem, Revenue};
use invoicedash::storage::{SeedData, SqliteStore};
use uuid::Uuid;

#[tokio::test]
async fn test_revenue_in_storage_order() -> Result<()> {
    let (store, _temp) = test_store().await?;
    for (month, amount) in [("Jan", 2000), ("Feb", 1800), ("Mar", 2200)] {
        store.save_revenue(&Revenue::new(month, amount)).await?;
    }

    let revenue = query_service(store).fetch_revenue().await?;
    let months: Vec<&str> = revenue.iter().map(|r| r.month.as_str()).collect();
    assert_eq!(months, vec!["Jan", "Feb", "Mar"]);
    assert_eq!(revenue[1].revenue, 1800);

    Ok(())
}

#[tokio::test]
async fn test_revenue_failure_is_data_fetch_error() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let service = QueryService::new(Arc::new(FaultyStore::new(store, Fault::Reads)));

    let err = service.fetch_revenue().await.unwrap_err();
    assert!(matches!(err, AppError::DataFetch { .. }));
    assert_eq!(err.to_string(), "Failed to fetch revenue data.");

    Ok(())
}

#[tokio::test]
async fn test_latest_invoices_newest_first_with_customer() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let data = StandardData::create(&store).await?;
    add_invoice(&store, &data.lee, 3040, InvoiceStatus::Paid, "2023-09-10").await?;

    let latest = query_service(store).fetch_latest_invoices().await?;
    assert_eq!(latest.len(), 5);

    assert_eq!(latest[0].name, "Lee Robinson");
    assert_eq!(latest[0].email, "lee@robinson.com");
    assert_eq!(latest[0].image_url, "/customers/lee-robinson.png");
    assert_eq!(latest[0].amount, "$30.40");
    assert_eq!(latest[1].name, "Delba de Oliveira");
    assert_eq!(latest[1].amount, "$5.00");
    // The oldest invoice (2022-06-05) is left out
    assert!(latest.iter().all(|i| i.amount != "$10.00"));

    Ok(())
}

#[tokio::test]
async fn test_card_data_on_empty_tables() -> Result<()> {
    let (store, _temp) = test_store().await?;

    let cards = query_service(store).fetch_card_data().await?;
    assert_eq!(cards.number_of_invoices, 0);
    assert_eq!(cards.number_of_customers, 0);
    assert_eq!(cards.total_paid_invoices, "$0.00");
    assert_eq!(cards.total_pending_invoices, "$0.00");

    Ok(())
}

#[tokio::test]
async fn test_card_data_sums_by_status() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let customer = add_customer(&store, "Amy Burns", "amy@burns.com").await?;
    add_invoice(&store, &customer, 500, InvoiceStatus::Pending, "2023-01-01").await?;
    add_invoice(&store, &customer, 1000, InvoiceStatus::Paid, "2023-01-02").await?;

    let cards = query_service(store).fetch_card_data().await?;
    assert_eq!(cards.number_of_invoices, 2);
    assert_eq!(cards.number_of_customers, 1);
    assert_eq!(cards.total_pending_invoices, "$5.00");
    assert_eq!(cards.total_paid_invoices, "$10.00");

    Ok(())
}

#[tokio::test]
async fn test_card_data_fails_on_any_sub_query() -> Result<()> {
    let (store, _temp) = test_store().await?;
    StandardData::create(&store).await?;

    for fault in [
        Fault::CountInvoices,
        Fault::CountCustomers,
        Fault::SumPaid,
        Fault::SumPending,
    ] {
        let service = QueryService::new(Arc::new(FaultyStore::new(store.clone(), fault)));
        let err = service.fetch_card_data().await.unwrap_err();
        assert!(
            matches!(err, AppError::DataFetch { what: "card data", .. }),
            "fault {:?} gave {:?}",
            fault,
            err
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_filtered_invoices_match_name_and_email_case_insensitively() -> Result<()> {
    let (store, _temp) = test_store().await?;
    StandardData::create(&store).await?;
    let service = query_service(store);

    let by_name = service.fetch_filtered_invoices("DELBA", 1).await?;
    assert_eq!(by_name.len(), 2);
    assert!(by_name.iter().all(|i| i.name == "Delba de Oliveira"));
    // Newest first
    assert_eq!(by_name[0].amount, "$5.00");
    assert_eq!(by_name[0].status, InvoiceStatus::Paid);

    let by_email = service.fetch_filtered_invoices("robinson.com", 1).await?;
    assert_eq!(by_email.len(), 2);
    assert!(by_email.iter().all(|i| i.email == "lee@robinson.com"));

    // Substring, not prefix
    let middle = service.fetch_filtered_invoices("rabb", 1).await?;
    assert_eq!(middle.len(), 2);

    let everything = service.fetch_filtered_invoices("", 1).await?;
    assert_eq!(everything.len(), 6);
    let dates: Vec<_> = everything.iter().map(|i| i.date).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);

    Ok(())
}

#[tokio::test]
async fn test_filtered_invoices_no_match_is_empty() -> Result<()> {
    let (store, _temp) = test_store().await?;
    StandardData::create(&store).await?;
    let service = query_service(store);

    assert!(service.fetch_filtered_invoices("nonexistent-query", 1).await?.is_empty());
    assert_eq!(service.fetch_invoices_pages("nonexistent-query").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_wildcards_in_query_are_literal() -> Result<()> {
    let (store, _temp) = test_store().await?;
    StandardData::create(&store).await?;
    let service = query_service(store);

    assert!(service.fetch_filtered_invoices("%", 1).await?.is_empty());
    assert!(service.fetch_filtered_invoices("_", 1).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_invoice_pagination() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let customer = add_customer(&store, "Balazs Orban", "balazs@orban.com").await?;
    for day in 1..=14 {
        let date = format!("2023-03-{:02}", day);
        add_invoice(&store, &customer, 100 * day, InvoiceStatus::Paid, &date).await?;
    }
    let service = query_service(store);

    let pages = service.fetch_invoices_pages("balazs").await?;
    assert_eq!(pages, 3);
    assert!(pages as usize * INVOICES_PER_PAGE >= 14);

    let first = service.fetch_filtered_invoices("balazs", 1).await?;
    let third = service.fetch_filtered_invoices("balazs", 3).await?;
    assert_eq!(first.len(), 6);
    assert_eq!(first[0].amount, "$14.00");
    assert_eq!(third.len(), 2);
    assert_eq!(third[1].amount, "$1.00");

    // Page 0 reads as the first page
    assert_eq!(service.fetch_filtered_invoices("balazs", 0).await?, first);
    assert!(service.fetch_filtered_invoices("balazs", 4).await?.is_empty());

    let page = service.fetch_invoices_page("balazs", 2).await?;
    assert_eq!(page.current_page, 2);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.invoices.len(), 6);
    assert_eq!(
        page.pagination,
        vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]
    );

    Ok(())
}

#[tokio::test]
async fn test_fetch_invoice_by_id() -> Result<()> {
    let (store, _temp) = test_store().await?;
    let data = StandardData::create(&store).await?;
    let invoice = add_invoice(&store, &data.evil, 4242, InvoiceStatus::Paid, "2024-02-29").await?;
    let service = query_service(store);

    let detail = service.fetch_invoice_by_id(invoice.id).await?;
    assert_eq!(detail.id, invoice.id);
    assert_eq!(detail.customer_id, data.evil.id);
    assert_eq!(detail.name, "Evil Rabbit");
    assert_eq!(detail.amount, 4242);
    assert_eq!(detail.status, InvoiceStatus::Paid);
    assert_eq!(detail.date, common::parse_date("2024-02-29"));

    let missing = Uuid::new_v4();
    let err = service.fetch_invoice_by_id(missing).await.unwrap_err();
    assert!(matches!(err, AppError::InvoiceNotFound(id) if id == missing));

    Ok(())
}

#[tokio::test]
async fn test_fetch_customers_ordered_by_name() -> Result<()> {
    let (store, _temp) = test_store().await?;
    StandardData::create(&store).await?;

    let customers = query_service(store).fetch_customers().await?;
    let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Delba de Oliveira", "Evil Rabbit", "Lee Robinson"]
    );

    Ok(())
}

#[tokio::test]
async fn test_filtered_customers_with_totals() -> Result<()> {
    let (store, _temp) = test_store().await?;
    StandardData::create(&store).await?;
    add_customer(&store, "Amy Burns", "amy@burns.com").await?;
    let service = query_service(store);

    let all = service.fetch_filtered_customers("").await?;
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].name, "Amy Burns");
    assert_eq!(all[0].total_invoices, 0);
    assert_eq!(all[0].total_pending, "$0.00");
    assert_eq!(all[0].total_paid, "$0.00");

    let lee = service.fetch_filtered_customers("LEE@").await?;
    assert_eq!(lee.len(), 1);
    assert_eq!(lee[0].total_invoices, 2);
    assert_eq!(lee[0].total_pending, "$542.46");
    assert_eq!(lee[0].total_paid, "$10.00");

    assert!(service.fetch_filtered_customers("nobody").await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_connect_from_config_and_seed() -> Result<()> {
    let temp = tempfile::TempDir::new()?;
    let url = sqlite_url(&temp);
    let store = SqliteStore::init(&url).await?;
    let summary = store.seed(&SeedData::sample()).await?;
    assert_eq!(summary.customers, 6);
    assert_eq!(summary.invoices, 13);
    assert_eq!(summary.revenue, 12);

    let config = StoreConfig::new(url, "local-key")?;
    let service = QueryService::connect(&config).await?;

    let cards = service.fetch_card_data().await?;
    assert_eq!(cards.number_of_invoices, 13);
    assert_eq!(cards.number_of_customers, 6);
    assert_eq!(cards.total_paid_invoices, "$1,006.26");
    assert_eq!(cards.total_pending_invoices, "$1,256.32");

    assert_eq!(service.fetch_revenue().await?.len(), 12);
    assert_eq!(service.fetch_invoices_pages("").await?, 3);

    Ok(())
}

#[tokio::test]
async fn test_connect_rejects_unsupported_store_url() -> Result<()> {
    let config = StoreConfig {
        url: "ftp://files.example.com".to_string(),
        key: "key".to_string(),
    };

    let err = QueryService::connect(&config).await.err().expect("connect should fail");
    assert!(matches!(
        err,
        AppError::Config(ConfigError::UnsupportedScheme(_))
    ));

    let err = MutationService::connect(&config).await.err().expect("connect should fail");
    assert!(matches!(err, AppError::Config(_)));

    Ok(())
}
