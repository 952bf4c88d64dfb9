use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use url::form_urlencoded;
use uuid::Uuid;

use crate::domain::{Cents, CustomerId, InvoiceStatus, cents_from_major};

pub const CUSTOMER_ID_FIELD: &str = "customerId";
pub const AMOUNT_FIELD: &str = "amount";
pub const STATUS_FIELD: &str = "status";

/// Key/value string fields of a submitted form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: HashMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from key/value pairs. A repeated key keeps its last value.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse an `application/x-www-form-urlencoded` body.
    pub fn from_urlencoded(body: &str) -> Self {
        Self::from_pairs(form_urlencoded::parse(body.as_bytes()).into_owned())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Validation messages keyed by form field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// What a failed mutation reports back to the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: FieldErrors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FormState {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            errors: FieldErrors::new(),
            message: Some(message.into()),
        }
    }

    /// True when the failure comes from field validation rather than the store.
    pub fn is_validation_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Messages recorded for one field.
    pub fn field_errors(&self, field: &str) -> &[String] {
        self.errors.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Invoice fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFields {
    pub customer_id: CustomerId,
    pub amount: Cents,
    pub status: InvoiceStatus,
}

/// Validate the customer, amount and status fields of an invoice form.
///
/// The amount is read as a decimal number of dollars and must be greater
/// than zero once rounded to cents.
pub fn validate_invoice_form(form: &FormData) -> Result<InvoiceFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let customer_id = form
        .get(CUSTOMER_ID_FIELD)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| Uuid::parse_str(v).ok());
    if customer_id.is_none() {
        errors
            .entry(CUSTOMER_ID_FIELD.to_string())
            .or_default()
            .push("Please select a customer.".to_string());
    }

    let amount = form
        .get(AMOUNT_FIELD)
        .and_then(coerce_number)
        .and_then(cents_from_major)
        .filter(|cents| *cents > 0);
    if amount.is_none() {
        errors
            .entry(AMOUNT_FIELD.to_string())
            .or_default()
            .push("Please enter an amount greater than $0.".to_string());
    }

    let status = form.get(STATUS_FIELD).and_then(InvoiceStatus::from_str);
    if status.is_none() {
        errors
            .entry(STATUS_FIELD.to_string())
            .or_default()
            .push("Please select an invoice status.".to_string());
    }

    match (customer_id, amount, status) {
        (Some(customer_id), Some(amount), Some(status)) => Ok(InvoiceFields {
            customer_id,
            amount,
            status,
        }),
        _ => Err(errors),
    }
}

/// Read a form value as a number. Blank input counts as zero.
fn coerce_number(value: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return Some(0.0);
    }
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}
