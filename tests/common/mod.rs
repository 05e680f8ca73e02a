#![allow(dead_code)]

use paygate::application::controller::PaymentController;
use paygate::application::registry::GatewayRegistry;
use paygate::config::GatewayConfig;
use paygate::domain::checkout::CallbackData;
use paygate::domain::payment::PaymentId;
use paygate::domain::ports::PaymentStoreRef;
use paygate::gateway::PAYMENT_ID_KEY;
use paygate::infrastructure::in_memory::InMemoryPaymentStore;
use std::sync::Arc;
use url::Url;

pub fn registry() -> GatewayRegistry {
    GatewayRegistry::from_configs([
        GatewayConfig::merchant_hosted("dps"),
        GatewayConfig::gateway_hosted("paypal", Url::parse("https://pay.example.com/").unwrap()),
    ])
    .unwrap()
}

pub fn store() -> PaymentStoreRef {
    Arc::new(InMemoryPaymentStore::new())
}

pub fn controller(registry: &GatewayRegistry, gateway: &str, store: &PaymentStoreRef) -> PaymentController {
    registry.resolve_controller(gateway).unwrap()(store.clone())
}

pub fn callback_for(id: PaymentId) -> CallbackData {
    CallbackData::new().with(PAYMENT_ID_KEY, id.to_string())
}
