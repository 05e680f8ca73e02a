use super::controller::PaymentController;
use crate::config::GatewayConfig;
use crate::domain::ports::PaymentStoreRef;
use crate::error::{PaymentError, Result};
use crate::gateway::card::{CardTransport, SimulatedCardTransport};
use crate::gateway::gateway_hosted::GatewayHostedProcessor;
use crate::gateway::merchant_hosted::MerchantHostedProcessor;
use crate::gateway::{ProcessorBox, ProcessorKind};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type ProcessorFactory = Arc<dyn Fn() -> ProcessorBox + Send + Sync>;
pub type ControllerFactory = Arc<dyn Fn(PaymentStoreRef) -> PaymentController + Send + Sync>;

struct GatewayDescriptor {
    processor: ProcessorFactory,
    controller: ControllerFactory,
}

/// Explicit gateway name → processor/controller table.
///
/// Filled once while loading configuration, then only read. Lookups are pure.
#[derive(Default)]
pub struct GatewayRegistry {
    gateways: BTreeMap<String, GatewayDescriptor>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry using the built-in processor for each config's kind.
    pub fn from_configs(configs: impl IntoIterator<Item = GatewayConfig>) -> Result<Self> {
        let mut registry = Self::new();
        for config in configs {
            registry.register_builtin(config)?;
        }
        Ok(registry)
    }

    /// Binds `config.name` to the built-in processor for `config.kind`.
    pub fn register_builtin(&mut self, config: GatewayConfig) -> Result<()> {
        let processor: ProcessorFactory = match config.kind {
            ProcessorKind::MerchantHosted => {
                let transport: Arc<dyn CardTransport> =
                    Arc::new(SimulatedCardTransport::new(config.simulate));
                let cvn_required = config.cvn_required;
                Arc::new(move || {
                    Box::new(MerchantHostedProcessor::new(cvn_required, transport.clone()))
                        as ProcessorBox
                })
            }
            ProcessorKind::GatewayHosted => {
                let endpoint = config.endpoint.clone().ok_or_else(|| {
                    PaymentError::Config(format!(
                        "gateway-hosted gateway `{}` needs an endpoint",
                        config.name
                    ))
                })?;
                Arc::new(move || Box::new(GatewayHostedProcessor::new(endpoint.clone())) as ProcessorBox)
            }
        };
        self.register(config, processor)
    }

    /// Binds `config.name` to a custom processor factory.
    pub fn register(&mut self, config: GatewayConfig, processor: ProcessorFactory) -> Result<()> {
        config.validate()?;
        if self.gateways.contains_key(&config.name) {
            return Err(PaymentError::Config(format!(
                "gateway `{}` registered twice",
                config.name
            )));
        }

        let config = Arc::new(config);
        let controller: ControllerFactory = {
            let config = config.clone();
            let processor = processor.clone();
            Arc::new(move |store: PaymentStoreRef| PaymentController::new(config.clone(), processor(), store))
        };

        tracing::debug!(gateway = %config.name, kind = ?config.kind, "gateway registered");
        self.gateways.insert(
            config.name.clone(),
            GatewayDescriptor {
                processor,
                controller,
            },
        );
        Ok(())
    }

    fn descriptor(&self, gateway: &str) -> Result<&GatewayDescriptor> {
        self.gateways
            .get(gateway)
            .ok_or_else(|| PaymentError::UnknownGateway(gateway.to_string()))
    }

    pub fn resolve_processor(&self, gateway: &str) -> Result<ProcessorFactory> {
        Ok(self.descriptor(gateway)?.processor.clone())
    }

    pub fn resolve_controller(&self, gateway: &str) -> Result<ControllerFactory> {
        Ok(self.descriptor(gateway)?.controller.clone())
    }

    /// Registered gateway names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.gateways.keys().map(String::as_str).collect()
    }
}
