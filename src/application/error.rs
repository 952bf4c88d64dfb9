use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::InvoiceId;

#[derive(Error, Debug)]
pub enum AppError {
    /// A read failed in the store. The cause is kept for logs only.
    #[error("Failed to fetch {what}.")]
    DataFetch {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl AppError {
    /// Log a store failure and wrap it as a fetch error for `what`.
    pub(crate) fn fetch(what: &'static str) -> impl FnOnce(anyhow::Error) -> AppError {
        move |source| {
            tracing::error!(error = ?source, "Database error while fetching {}", what);
            AppError::DataFetch { what, source }
        }
    }
}
