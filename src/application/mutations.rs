use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::domain::{InvoiceId, InvoiceUpdate, NewInvoice};
use crate::storage::{self, RemoteStore};

use super::{
    AppError, FormData, FormState, INVOICES_PATH, LogRevalidator, Revalidator,
    validate_invoice_form,
};

/// Result of a form-driven mutation.
///
/// Validation problems and store failures are both reported as values;
/// none of the mutations return an error to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum MutationOutcome {
    /// The write was committed. `redirect` is where the caller should navigate next.
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        redirect: Option<String>,
    },
    /// Nothing was committed.
    Failure(FormState),
}

impl MutationOutcome {
    fn redirect(path: &str) -> Self {
        MutationOutcome::Success {
            message: None,
            redirect: Some(path.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MutationOutcome::Success { .. })
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            MutationOutcome::Success { redirect, .. } => redirect.as_deref(),
            MutationOutcome::Failure(_) => None,
        }
    }

    pub fn form_state(&self) -> Option<&FormState> {
        match self {
            MutationOutcome::Success { .. } => None,
            MutationOutcome::Failure(state) => Some(state),
        }
    }
}

/// Validate-then-write operations on invoices.
#[derive(Clone)]
pub struct MutationService {
    store: Arc<dyn RemoteStore>,
    revalidator: Arc<dyn Revalidator>,
}

impl MutationService {
    pub fn new(store: Arc<dyn RemoteStore>, revalidator: Arc<dyn Revalidator>) -> Self {
        Self { store, revalidator }
    }

    /// Open the store described by `config`; invalidations are logged.
    pub async fn connect(config: &StoreConfig) -> Result<Self, AppError> {
        config.kind()?;
        Ok(Self::new(
            storage::connect(config).await?,
            Arc::new(LogRevalidator),
        ))
    }

    pub async fn create_invoice(&self, form: &FormData) -> MutationOutcome {
        debug!("Validating new invoice");
        let fields = match validate_invoice_form(form) {
            Ok(fields) => fields,
            Err(errors) => {
                debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Invoice form rejected");
                return MutationOutcome::Failure(FormState {
                    errors,
                    message: Some("Missing Fields. Failed to Create Invoice.".to_string()),
                });
            }
        };

        let invoice = NewInvoice {
            customer_id: fields.customer_id,
            amount: fields.amount,
            status: fields.status,
            date: Utc::now().date_naive(),
        };

        debug!(customer_id = %invoice.customer_id, amount = invoice.amount, "Persisting new invoice");
        match self.store.insert_invoice(&invoice).await {
            Ok(id) => info!(invoice_id = %id, "Created invoice"),
            Err(e) => {
                error!(error = ?e, "Database error while creating invoice");
                return MutationOutcome::Failure(FormState::message(
                    "Database Error: Failed to Create Invoice.",
                ));
            }
        }

        self.revalidator.revalidate_path(INVOICES_PATH);
        MutationOutcome::redirect(INVOICES_PATH)
    }

    pub async fn update_invoice(&self, id: InvoiceId, form: &FormData) -> MutationOutcome {
        debug!(invoice_id = %id, "Validating invoice update");
        let fields = match validate_invoice_form(form) {
            Ok(fields) => fields,
            Err(errors) => {
                debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Invoice form rejected");
                return MutationOutcome::Failure(FormState {
                    errors,
                    message: Some("Missing Fields. Failed to Update Invoice.".to_string()),
                });
            }
        };

        let update = InvoiceUpdate {
            customer_id: fields.customer_id,
            amount: fields.amount,
            status: fields.status,
        };

        debug!(invoice_id = %id, "Persisting invoice update");
        match self.store.update_invoice(id, &update).await {
            Ok(0) => {
                warn!(invoice_id = %id, "No invoice to update");
                return MutationOutcome::Failure(FormState::message("Invoice not found."));
            }
            Ok(_) => info!(invoice_id = %id, "Updated invoice"),
            Err(e) => {
                error!(invoice_id = %id, error = ?e, "Database error while updating invoice");
                return MutationOutcome::Failure(FormState::message(
                    "Database Error: Failed to Update Invoice.",
                ));
            }
        }

        self.revalidator.revalidate_path(INVOICES_PATH);
        MutationOutcome::redirect(INVOICES_PATH)
    }

    /// Delete an invoice. The list view is invalidated after every attempt
    /// that reached the store, whatever its result.
    pub async fn delete_invoice(&self, id: InvoiceId) -> MutationOutcome {
        debug!(invoice_id = %id, "Deleting invoice");
        let outcome = match self.store.delete_invoice(id).await {
            Ok(0) => {
                warn!(invoice_id = %id, "No invoice to delete");
                MutationOutcome::Failure(FormState::message("Invoice not found."))
            }
            Ok(_) => {
                info!(invoice_id = %id, "Deleted invoice");
                MutationOutcome::Success {
                    message: Some("Deleted Invoice.".to_string()),
                    redirect: None,
                }
            }
            Err(e) => {
                error!(invoice_id = %id, error = ?e, "Database error while deleting invoice");
                MutationOutcome::Failure(FormState::message(
                    "Database Error: Failed to Delete Invoice.",
                ))
            }
        };

        self.revalidator.revalidate_path(INVOICES_PATH);
        outcome
    }
}
