/// Path of the invoices list view.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

/// Signals downstream renderers that cached data for a path is stale.
pub trait Revalidator: Send + Sync {
    fn revalidate_path(&self, path: &str);
}

/// Revalidator that only records the event in the logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRevalidator;

impl Revalidator for LogRevalidator {
    fn revalidate_path(&self, path: &str) {
        tracing::info!(path, "Revalidating path");
    }
}
