use crate::config::{self, GatewayConfig};
use crate::domain::checkout::{CallbackData, CheckoutData};
use crate::domain::money::{Amount, Money};
use crate::domain::payment::{PaymentId, PaymentRecord, PaymentStatus};
use crate::domain::ports::PaymentStoreRef;
use crate::error::{PaymentError, Result};
use crate::gateway::{
    FieldSet, PaymentRequest, ProcessorBox, RequestOutcome, ResponseOutcome,
};
use std::sync::Arc;
use std::time::Duration;

/// What `process_payment` hands back to the web layer.
#[derive(Debug, Clone)]
pub struct CheckoutResult {
    /// The record as stored after the gateway call.
    pub payment: PaymentRecord,
    pub outcome: RequestOutcome,
}

/// Drives one gateway's payment attempts from checkout to completion.
///
/// Gateway specifics live in the held [`PaymentProcessor`](crate::gateway::PaymentProcessor);
/// the controller owns the shared workflow and every status change. Status
/// writes go through the store's compare-and-swap on the previously observed
/// status, so a complete and a cancel racing on the same payment cannot both
/// win.
pub struct PaymentController {
    gateway: Arc<GatewayConfig>,
    processor: ProcessorBox,
    store: PaymentStoreRef,
}

impl PaymentController {
    pub fn new(gateway: Arc<GatewayConfig>, processor: ProcessorBox, store: PaymentStoreRef) -> Self {
        Self {
            gateway,
            processor,
            store,
        }
    }

    pub fn gateway_name(&self) -> &str {
        &self.gateway.name
    }

    /// Fields the checkout form has to collect for this gateway.
    pub fn request_fields(&self, checkout: &CheckoutData) -> FieldSet {
        self.processor.build_request_fields(checkout)
    }

    /// Relative url the gateway returns to on success.
    pub fn complete_link(&self) -> String {
        format!("{}/complete", self.gateway.url_segment())
    }

    /// Relative url the gateway returns to on cancellation.
    pub fn cancel_link(&self) -> String {
        format!("{}/cancel", self.gateway.url_segment())
    }

    /// Records a pending payment for the checkout and submits it to the gateway.
    ///
    /// The record is stored as `Pending` before the gateway is contacted. A
    /// gateway error or timeout moves it to `Failure` and is returned as
    /// `PaymentError::GatewayRequest`.
    pub async fn process_payment(&self, checkout: CheckoutData) -> Result<CheckoutResult> {
        let amount = Amount::new(checkout.amount.ok_or(PaymentError::MissingAmount)?)?;
        let currency = checkout
            .currency
            .clone()
            .unwrap_or_else(config::site_currency);

        let mut record = PaymentRecord::new(self.gateway.name.clone());
        record.paid_for = checkout.paid_for.clone();
        record.paid_by = checkout.paid_by.clone();
        record.set_amount(Money::new(amount.value(), currency))?;
        let mut record = self.store.create(record).await?;

        record.transition(PaymentStatus::Pending)?;
        self.store.save(&record, PaymentStatus::Incomplete).await?;
        tracing::info!(
            payment = %record.id,
            gateway = %self.gateway.name,
            amount = %record.amount(),
            "payment pending"
        );

        let request = PaymentRequest {
            payment_id: record.id,
            amount: record.amount().clone(),
            checkout,
            complete_link: self.complete_link(),
            cancel_link: self.cancel_link(),
        };
        let timeout = Duration::from_millis(self.gateway.timeout_ms);
        // Dropping the timed-out future abandons the in-flight request.
        let result = match tokio::time::timeout(timeout, self.processor.process_request(&request)).await {
            Ok(result) => result,
            Err(_) => Err(PaymentError::GatewayRequest(format!(
                "no response from gateway `{}` within {} ms",
                self.gateway.name, self.gateway.timeout_ms
            ))),
        };

        match result {
            Ok(RequestOutcome::Approved { reference }) => {
                let payment = self
                    .settle(record, PaymentStatus::Success, Some(reference.clone()))
                    .await?;
                Ok(CheckoutResult {
                    payment,
                    outcome: RequestOutcome::Approved { reference },
                })
            }
            Ok(RequestOutcome::Declined { reason }) => {
                tracing::warn!(payment = %record.id, reason = %reason, "gateway declined payment");
                let payment = self
                    .settle(record, PaymentStatus::Failure, Some(reason.clone()))
                    .await?;
                Ok(CheckoutResult {
                    payment,
                    outcome: RequestOutcome::Declined { reason },
                })
            }
            Ok(outcome @ RequestOutcome::Redirect { .. }) => Ok(CheckoutResult {
                payment: record,
                outcome,
            }),
            Err(err) => {
                let reason = match err {
                    PaymentError::GatewayRequest(reason) => reason,
                    other => other.to_string(),
                };
                tracing::warn!(payment = %record.id, error = %reason, "gateway request failed");
                record.exception_error = Some(reason.clone());
                match self.settle(record, PaymentStatus::Failure, None).await {
                    Ok(_) => Err(PaymentError::GatewayRequest(reason)),
                    Err(store_err) => {
                        tracing::error!(error = %store_err, "could not record failed gateway request");
                        Err(PaymentError::GatewayRequest(format!(
                            "{}; recording the failure also failed: {}",
                            reason, store_err
                        )))
                    }
                }
            }
        }
    }

    /// Payment complete handler, shared by all gateways.
    ///
    /// The payment reference is resolved first, then the processor interprets
    /// the callback. A decline reported there fails the payment and a
    /// cancellation reverts it instead.
    pub async fn complete(&self, callback: &CallbackData) -> Result<PaymentRecord> {
        let id = self.resolve_payment_id(callback)?;
        let (status, message) = match self.processor.process_response(callback)? {
            ResponseOutcome::Approved { message } => (PaymentStatus::Success, message),
            ResponseOutcome::Declined { message } => (PaymentStatus::Failure, Some(message)),
            ResponseOutcome::Cancelled { message } => (PaymentStatus::Incomplete, message),
        };
        self.update_status(id, status, message).await
    }

    /// Payment cancel handler: reverts a pending payment to `Incomplete`.
    ///
    /// The callback's interpretation only supplies the stored message.
    pub async fn cancel(&self, callback: &CallbackData) -> Result<PaymentRecord> {
        let id = self.resolve_payment_id(callback)?;
        let message = match self.processor.process_response(callback) {
            Ok(ResponseOutcome::Approved { message } | ResponseOutcome::Cancelled { message }) => {
                message
            }
            Ok(ResponseOutcome::Declined { message }) => Some(message),
            Err(err) => {
                tracing::debug!(payment = %id, error = %err, "cancel callback not understood");
                None
            }
        };
        self.update_status(id, PaymentStatus::Incomplete, message)
            .await
    }

    /// Marks the referenced payment as failed with the gateway's message.
    pub async fn fail(&self, callback: &CallbackData, message: &str) -> Result<PaymentRecord> {
        let id = self.resolve_payment_id(callback)?;
        self.update_status(id, PaymentStatus::Failure, Some(message.to_string()))
            .await
    }

    fn resolve_payment_id(&self, callback: &CallbackData) -> Result<PaymentId> {
        self.processor
            .get_payment_id(callback)
            .map_err(|e| PaymentError::PaymentNotFound(e.to_string()))
    }

    async fn update_status(
        &self,
        id: PaymentId,
        status: PaymentStatus,
        message: Option<String>,
    ) -> Result<PaymentRecord> {
        let record = self
            .store
            .load(id)
            .await?
            .filter(|r| r.gateway == self.gateway.name)
            .ok_or_else(|| {
                PaymentError::PaymentNotFound(format!(
                    "no payment {} for gateway `{}`",
                    id, self.gateway.name
                ))
            })?;
        self.settle(record, status, message).await
    }

    async fn settle(
        &self,
        mut record: PaymentRecord,
        status: PaymentStatus,
        message: Option<String>,
    ) -> Result<PaymentRecord> {
        let prior = record.status();
        record.transition(status)?;
        if message.is_some() {
            record.message = message;
        }

        if let Err(err) = self.store.save(&record, prior).await {
            if let PaymentError::ConcurrentUpdateConflict { found, .. } = &err {
                tracing::warn!(payment = %record.id, found = %found, "payment changed underneath update");
            }
            return Err(err);
        }
        tracing::info!(payment = %record.id, from = %prior, to = %status, "payment status updated");
        Ok(record)
    }
}
