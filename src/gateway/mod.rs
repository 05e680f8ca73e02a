//! Gateway-specific request building and callback interpretation.
//!
//! Every gateway is driven through the [`PaymentProcessor`] capability. The two
//! shipped variants differ in who collects card details: merchant-hosted
//! processors collect them on the site and submit them to the gateway API,
//! gateway-hosted processors redirect the payer and only see the callback.

use crate::domain::checkout::{CallbackData, CheckoutData};
use crate::domain::money::Money;
use crate::domain::payment::PaymentId;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

pub mod card;
pub mod gateway_hosted;
pub mod merchant_hosted;

pub const PAYMENT_ID_KEY: &str = "PaymentID";
pub const STATUS_KEY: &str = "Status";
pub const MESSAGE_KEY: &str = "Message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorKind {
    MerchantHosted,
    GatewayHosted,
}

/// One input the checkout form must collect.
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub max_length: Option<usize>,
    pub required: bool,
}

/// Fields a processor needs from the payer, consumed by the form renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<FormField>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: FormField) {
        self.fields.push(field);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormField> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }
}

/// Everything a processor needs to submit or prepare one pending payment.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub payment_id: PaymentId,
    pub amount: Money,
    pub checkout: CheckoutData,
    pub complete_link: String,
    pub cancel_link: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// The gateway accepted the card synchronously.
    Approved { reference: String },
    /// The gateway explicitly declined the card.
    Declined { reason: String },
    /// The payer must be sent to the gateway's hosted page.
    Redirect { url: Url },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseOutcome {
    Approved { message: Option<String> },
    Declined { message: String },
    Cancelled { message: Option<String> },
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    fn kind(&self) -> ProcessorKind;

    fn build_request_fields(&self, checkout: &CheckoutData) -> FieldSet;

    /// Sends or prepares the gateway request for a pending payment.
    async fn process_request(&self, request: &PaymentRequest) -> Result<RequestOutcome>;

    /// Interprets a callback. Never touches stored payments.
    fn process_response(&self, callback: &CallbackData) -> Result<ResponseOutcome>;

    fn get_payment_id(&self, callback: &CallbackData) -> Result<PaymentId>;
}

pub type ProcessorBox = Box<dyn PaymentProcessor>;

pub(crate) fn payment_id_from(callback: &CallbackData) -> Result<PaymentId> {
    callback
        .get(PAYMENT_ID_KEY)
        .ok_or_else(|| PaymentError::UnresolvablePayment(format!("missing `{}`", PAYMENT_ID_KEY)))?
        .parse()
}

/// Maps the `Status`/`Message` pair of a callback onto an outcome. A callback
/// without a status counts as approval, since return redirects usually carry
/// nothing but the payment reference.
pub(crate) fn interpret_status(callback: &CallbackData) -> Result<ResponseOutcome> {
    let message = callback.get(MESSAGE_KEY).map(str::to_string);
    let status = callback
        .get(STATUS_KEY)
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "approved".to_string());

    match status.as_str() {
        "approved" | "success" | "ok" => Ok(ResponseOutcome::Approved { message }),
        "declined" | "failed" | "failure" => Ok(ResponseOutcome::Declined {
            message: message.unwrap_or_else(|| "declined by gateway".to_string()),
        }),
        "cancelled" | "canceled" => Ok(ResponseOutcome::Cancelled { message }),
        other => Err(PaymentError::GatewayRequest(format!(
            "unrecognised callback status `{}`",
            other
        ))),
    }
}
