use crate::domain::payment::{PaymentId, PaymentStatus};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PaymentError {
    #[error("no payment gateway registered under `{0}`")]
    #[diagnostic(
        code(paygate::unknown_gateway),
        help("register the gateway in the configuration file before serving requests")
    )]
    UnknownGateway(String),

    #[error("payment amount not set")]
    #[diagnostic(code(paygate::missing_amount))]
    MissingAmount,

    #[error("validation error: {0}")]
    #[diagnostic(code(paygate::validation))]
    Validation(String),

    #[error("gateway request failed: {0}")]
    #[diagnostic(code(paygate::gateway_request))]
    GatewayRequest(String),

    #[error("callback carries no payment reference: {0}")]
    #[diagnostic(code(paygate::unresolvable_payment))]
    UnresolvablePayment(String),

    #[error("cannot load the corresponding payment: {0}")]
    #[diagnostic(code(paygate::payment_not_found))]
    PaymentNotFound(String),

    #[error("payment {id} was updated concurrently (expected {expected}, found {found})")]
    #[diagnostic(
        code(paygate::concurrent_update),
        help("reload the payment and retry, or report the stale state")
    )]
    ConcurrentUpdateConflict {
        id: PaymentId,
        expected: PaymentStatus,
        found: PaymentStatus,
    },

    #[error("payment {id} cannot move from {from} to {to}")]
    #[diagnostic(code(paygate::invalid_transition))]
    InvalidTransition {
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("configuration error: {0}")]
    #[diagnostic(code(paygate::config))]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal storage error: {0}")]
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for PaymentError {
    fn from(err: rocksdb::Error) -> Self {
        PaymentError::Internal(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, PaymentError>;
