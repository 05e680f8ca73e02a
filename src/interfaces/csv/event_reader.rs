use crate::domain::checkout::{CallbackData, CheckoutData};
use crate::domain::money::Currency;
use crate::domain::payment::PaidFor;
use crate::error::{PaymentError, Result};
use crate::gateway::card::{CARD_HOLDER_NAME, CARD_NUMBER, CVN, DATE_EXPIRY};
use crate::gateway::{MESSAGE_KEY, PAYMENT_ID_KEY, STATUS_KEY};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Checkout,
    Complete,
    Cancel,
    Fail,
}

/// One checkout submission or gateway callback.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct PaymentEvent {
    pub action: EventAction,
    pub gateway: String,
    #[serde(default)]
    pub payment: Option<String>,
    /// Parsed from the field text so the written scale survives.
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub card_holder: Option<String>,
    #[serde(default)]
    pub card_number: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub cvn: Option<String>,
    #[serde(default)]
    pub paid_for_type: Option<String>,
    #[serde(default)]
    pub paid_for_id: Option<String>,
    #[serde(default)]
    pub paid_by: Option<String>,
}

impl PaymentEvent {
    pub fn to_checkout(&self) -> CheckoutData {
        let mut checkout = CheckoutData {
            amount: self.amount,
            currency: self.currency.clone(),
            paid_by: self.paid_by.clone(),
            ..CheckoutData::default()
        };
        if let (Some(object_type), Some(object_id)) = (&self.paid_for_type, &self.paid_for_id) {
            checkout.paid_for = Some(PaidFor {
                object_type: object_type.clone(),
                object_id: object_id.clone(),
            });
        }
        let card_fields = [
            (CARD_HOLDER_NAME, &self.card_holder),
            (CARD_NUMBER, &self.card_number),
            (DATE_EXPIRY, &self.expiry),
            (CVN, &self.cvn),
        ];
        for (name, value) in card_fields {
            if let Some(value) = value {
                checkout.fields.insert(name.to_string(), value.clone());
            }
        }
        checkout
    }

    pub fn to_callback(&self) -> CallbackData {
        let mut callback = CallbackData::new();
        let entries = [
            (PAYMENT_ID_KEY, &self.payment),
            (STATUS_KEY, &self.status),
            (MESSAGE_KEY, &self.message),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                callback.insert(key, value.clone());
            }
        }
        callback
    }
}

/// Reads payment events from a CSV source.
///
/// Whitespace is trimmed and rows may omit trailing columns they do not use.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily reads and deserializes events.
    pub fn events(self) -> impl Iterator<Item = Result<PaymentEvent>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(PaymentError::from))
    }
}
