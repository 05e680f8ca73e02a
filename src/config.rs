//! Process-wide settings and per-gateway configuration.
//!
//! The site currency and the gateway table are written once at startup and
//! only read afterwards.

use crate::application::registry::GatewayRegistry;
use crate::domain::money::Currency;
use crate::error::{PaymentError, Result};
use crate::gateway::ProcessorKind;
use crate::gateway::card::SimulatedBehavior;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::RwLock;
use url::Url;

static SITE_CURRENCY: RwLock<Option<Currency>> = RwLock::new(None);

/// Returns the currency new payments default to (`USD` unless changed).
pub fn site_currency() -> Currency {
    SITE_CURRENCY
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
        .unwrap_or_default()
}

/// Sets the currency code that this site uses, e.g. `"NZD"`.
pub fn set_site_currency(code: &str) -> Result<()> {
    let currency = Currency::new(code)?;
    tracing::debug!(currency = %currency, "site currency set");
    *SITE_CURRENCY.write().unwrap_or_else(|e| e.into_inner()) = Some(currency);
    Ok(())
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Configuration of one gateway binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub name: String,
    pub kind: ProcessorKind,
    /// Path segment the web layer routes callbacks under. Defaults to `name`.
    #[serde(default)]
    pub url_segment: Option<String>,
    #[serde(default = "default_true")]
    pub cvn_required: bool,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Hosted payment page, gateway-hosted only.
    #[serde(default)]
    pub endpoint: Option<Url>,
    #[serde(default)]
    pub simulate: SimulatedBehavior,
}

impl GatewayConfig {
    pub fn merchant_hosted(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ProcessorKind::MerchantHosted,
            url_segment: None,
            cvn_required: true,
            timeout_ms: default_timeout_ms(),
            endpoint: None,
            simulate: SimulatedBehavior::default(),
        }
    }

    pub fn gateway_hosted(name: &str, endpoint: Url) -> Self {
        Self {
            kind: ProcessorKind::GatewayHosted,
            endpoint: Some(endpoint),
            ..Self::merchant_hosted(name)
        }
    }

    pub fn url_segment(&self) -> &str {
        self.url_segment.as_deref().unwrap_or(&self.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PaymentError::Config("gateway name must not be empty".into()));
        }
        let segment = self.url_segment();
        if segment.is_empty()
            || segment.starts_with('/')
            || segment.ends_with('/')
            || segment.chars().any(char::is_whitespace)
        {
            return Err(PaymentError::Config(format!(
                "gateway `{}` has invalid url segment `{}`",
                self.name, segment
            )));
        }
        if self.timeout_ms == 0 {
            return Err(PaymentError::Config(format!(
                "gateway `{}` needs a non-zero timeout",
                self.name
            )));
        }
        Ok(())
    }
}

/// Settings file contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub site_currency: Option<Currency>,
    pub gateways: Vec<GatewayConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut gateways = vec![GatewayConfig::merchant_hosted("dps")];
        if let Ok(endpoint) = Url::parse("https://sandbox.paypal.example/checkout") {
            gateways.push(GatewayConfig::gateway_hosted("paypal", endpoint));
        }
        Self {
            site_currency: None,
            gateways,
        }
    }
}

impl Settings {
    /// Reads settings from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&raw)?;
        Ok(settings)
    }

    /// Installs the site currency and builds the gateway registry.
    pub fn apply(&self) -> Result<GatewayRegistry> {
        if let Some(currency) = &self.site_currency {
            set_site_currency(currency.as_str())?;
        }
        GatewayRegistry::from_configs(self.gateways.iter().cloned())
    }
}
