use super::card::{
    CARD_HOLDER_NAME, CARD_NUMBER, CVN, CardCharge, CardDetails, CardTransport, DATE_EXPIRY,
    TransportReply,
};
use super::{
    FieldSet, FormField, PaymentProcessor, PaymentRequest, ProcessorKind, RequestOutcome,
    ResponseOutcome, interpret_status, payment_id_from,
};
use crate::domain::checkout::{CallbackData, CheckoutData};
use crate::domain::payment::PaymentId;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Processor for gateways where the site collects card details and submits
/// them straight to the gateway API.
pub struct MerchantHostedProcessor {
    cvn_required: bool,
    transport: Arc<dyn CardTransport>,
}

impl MerchantHostedProcessor {
    pub fn new(cvn_required: bool, transport: Arc<dyn CardTransport>) -> Self {
        Self {
            cvn_required,
            transport,
        }
    }

    fn credit_card_fields(&self) -> FieldSet {
        let mut fields = FieldSet::new();
        fields.push(FormField {
            name: CARD_HOLDER_NAME,
            label: "Credit Card Holder Name",
            max_length: None,
            required: true,
        });
        fields.push(FormField {
            name: CARD_NUMBER,
            label: "Credit Card Number",
            max_length: Some(19),
            required: true,
        });
        fields.push(FormField {
            name: DATE_EXPIRY,
            label: "Credit Card Expiry (MMYY)",
            max_length: Some(4),
            required: true,
        });
        if self.cvn_required {
            fields.push(FormField {
                name: CVN,
                label: "Credit Card CVN (3 or 4 digits)",
                max_length: Some(4),
                required: true,
            });
        }
        fields
    }
}

#[async_trait]
impl PaymentProcessor for MerchantHostedProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::MerchantHosted
    }

    fn build_request_fields(&self, _checkout: &CheckoutData) -> FieldSet {
        self.credit_card_fields()
    }

    async fn process_request(&self, request: &PaymentRequest) -> Result<RequestOutcome> {
        // Bad card input never reaches the gateway.
        let card = CardDetails::from_checkout(&request.checkout, self.cvn_required)?;
        tracing::debug!(
            payment = %request.payment_id,
            card = %card.masked(),
            amount = %request.amount,
            "submitting card charge"
        );

        let charge = CardCharge {
            payment_id: request.payment_id,
            amount: request.amount.clone(),
            card,
        };
        Ok(match self.transport.submit(&charge).await? {
            TransportReply::Approved { reference } => RequestOutcome::Approved { reference },
            TransportReply::Declined { reason } => RequestOutcome::Declined { reason },
        })
    }

    fn process_response(&self, callback: &CallbackData) -> Result<ResponseOutcome> {
        interpret_status(callback)
    }

    fn get_payment_id(&self, callback: &CallbackData) -> Result<PaymentId> {
        payment_id_from(callback)
    }
}
