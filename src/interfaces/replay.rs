use super::csv::event_reader::{EventAction, PaymentEvent};
use crate::application::registry::GatewayRegistry;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::PaymentStoreRef;
use crate::error::{PaymentError, Result};
use crate::gateway::RequestOutcome;

/// Feeds checkout submissions and gateway callbacks to the gateway
/// controllers, the way the web layer would route them.
pub struct EventReplayer {
    registry: GatewayRegistry,
    store: PaymentStoreRef,
}

impl EventReplayer {
    pub fn new(registry: GatewayRegistry, store: PaymentStoreRef) -> Self {
        Self { registry, store }
    }

    /// Handles one event with a freshly resolved controller, as one request.
    pub async fn apply(&self, event: &PaymentEvent) -> Result<PaymentRecord> {
        let factory = self.registry.resolve_controller(&event.gateway)?;
        let controller = factory(self.store.clone());

        match event.action {
            EventAction::Checkout => {
                let result = controller.process_payment(event.to_checkout()).await?;
                if let RequestOutcome::Redirect { url } = &result.outcome {
                    tracing::info!(payment = %result.payment.id, redirect = %url, "payer redirected to gateway");
                }
                Ok(result.payment)
            }
            EventAction::Complete => controller.complete(&event.to_callback()).await,
            EventAction::Cancel => controller.cancel(&event.to_callback()).await,
            EventAction::Fail => {
                let message = event
                    .message
                    .as_deref()
                    .unwrap_or("payment failed at gateway");
                controller.fail(&event.to_callback(), message).await
            }
        }
    }

    /// Consumes the replayer and returns the final state of all payments.
    pub async fn into_results(self) -> Result<Vec<PaymentRecord>> {
        self.store.all().await
    }
}

/// Errors a replay run reports per event and then moves past.
pub fn is_recoverable(err: &PaymentError) -> bool {
    !matches!(
        err,
        PaymentError::Io(_) | PaymentError::Internal(_) | PaymentError::Config(_)
    )
}
