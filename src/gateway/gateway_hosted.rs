use super::{
    FieldSet, PAYMENT_ID_KEY, PaymentProcessor, PaymentRequest, ProcessorKind, RequestOutcome,
    ResponseOutcome, interpret_status, payment_id_from,
};
use crate::domain::checkout::{CallbackData, CheckoutData};
use crate::domain::payment::PaymentId;
use crate::error::Result;
use async_trait::async_trait;
use url::Url;

/// Processor for gateways that collect card details on their own hosted page.
/// The site only builds the redirect and reads the callback.
pub struct GatewayHostedProcessor {
    endpoint: Url,
}

impl GatewayHostedProcessor {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl PaymentProcessor for GatewayHostedProcessor {
    fn kind(&self) -> ProcessorKind {
        ProcessorKind::GatewayHosted
    }

    fn build_request_fields(&self, _checkout: &CheckoutData) -> FieldSet {
        FieldSet::new()
    }

    async fn process_request(&self, request: &PaymentRequest) -> Result<RequestOutcome> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair(PAYMENT_ID_KEY, &request.payment_id.to_string())
            .append_pair("Amount", &request.amount.amount.to_string())
            .append_pair("Currency", request.amount.currency.as_str())
            .append_pair("ReturnURL", &request.complete_link)
            .append_pair("CancelURL", &request.cancel_link);
        Ok(RequestOutcome::Redirect { url })
    }

    fn process_response(&self, callback: &CallbackData) -> Result<ResponseOutcome> {
        interpret_status(callback)
    }

    fn get_payment_id(&self, callback: &CallbackData) -> Result<PaymentId> {
        payment_id_from(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Currency, Money};
    use crate::error::PaymentError;
    use rust_decimal_macros::dec;

    fn processor() -> GatewayHostedProcessor {
        GatewayHostedProcessor::new(Url::parse("https://pay.example.com/checkout").unwrap())
    }

    #[test]
    fn test_no_fields_collected_on_site() {
        assert!(processor().build_request_fields(&CheckoutData::default()).is_empty());
    }

    #[tokio::test]
    async fn test_redirect_carries_payment_reference() {
        let request = PaymentRequest {
            payment_id: PaymentId(12),
            amount: Money::new(dec!(10.50), Currency::new("NZD").unwrap()),
            checkout: CheckoutData::new(dec!(10.50)),
            complete_link: "paypal/complete".to_string(),
            cancel_link: "paypal/cancel".to_string(),
        };

        let RequestOutcome::Redirect { url } = processor().process_request(&request).await.unwrap()
        else {
            panic!("expected a redirect");
        };
        assert_eq!(url.host_str(), Some("pay.example.com"));
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("PaymentID".to_string(), "12".to_string())));
        assert!(query.contains(&("Amount".to_string(), "10.50".to_string())));
        assert!(query.contains(&("Currency".to_string(), "NZD".to_string())));
        assert!(query.contains(&("CancelURL".to_string(), "paypal/cancel".to_string())));
    }

    #[test]
    fn test_callback_without_reference() {
        let cb = CallbackData::new().with("Status", "approved");
        assert!(matches!(
            processor().get_payment_id(&cb),
            Err(PaymentError::UnresolvablePayment(_))
        ));
    }
}
