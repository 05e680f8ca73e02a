use super::money::{Currency, Money};
use crate::config;
use crate::error::PaymentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store-assigned identity of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub u64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PaymentId {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(PaymentId)
            .map_err(|_| PaymentError::UnresolvablePayment(format!("`{}` is not a payment id", s)))
    }
}

/// Lifecycle of a payment attempt.
///
/// * `Incomplete`: created, nothing confirmed yet (also where a cancelled attempt returns)
/// * `Pending`: submitted to the gateway, awaiting its verdict
/// * `Success`: the gateway confirmed the payment
/// * `Failure`: the gateway declined or the request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Incomplete,
    Pending,
    Success,
    Failure,
}

impl PaymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failure)
    }

    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!(
            (self, next),
            (Incomplete, Pending)
                | (Pending, Success)
                | (Pending, Incomplete)
                | (Incomplete, Failure)
                | (Pending, Failure)
        )
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Incomplete => "Incomplete",
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Success => "Success",
            PaymentStatus::Failure => "Failure",
        };
        f.write_str(s)
    }
}

/// The business object a payment settles (an order, an invoice, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaidFor {
    pub object_type: String,
    pub object_id: String,
}

/// Persisted state of one payment attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    /// Name of the gateway that owns this attempt.
    pub gateway: String,
    status: PaymentStatus,
    amount: Money,
    pub message: Option<String>,
    pub paid_for: Option<PaidFor>,
    pub paid_by: Option<String>,
    /// Any error raised while processing, kept for diagnostics.
    pub exception_error: Option<String>,
}

impl PaymentRecord {
    /// Creates an `Incomplete` record whose currency defaults to the site
    /// currency configured right now.
    pub fn new(gateway: impl Into<String>) -> Self {
        Self {
            id: PaymentId::default(),
            gateway: gateway.into(),
            status: PaymentStatus::Incomplete,
            amount: Money::zero(config::site_currency()),
            message: None,
            paid_for: None,
            paid_by: None,
            exception_error: None,
        }
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn amount(&self) -> &Money {
        &self.amount
    }

    /// Sets the charged amount. Settled payments keep theirs.
    pub fn set_amount(&mut self, amount: Money) -> Result<(), PaymentError> {
        if self.status.is_terminal() {
            return Err(PaymentError::Validation(format!(
                "payment {} is {} and its amount can no longer change",
                self.id, self.status
            )));
        }
        self.amount = amount;
        Ok(())
    }

    pub fn currency(&self) -> &Currency {
        &self.amount.currency
    }

    /// Moves the record along the payment state machine.
    pub fn transition(&mut self, next: PaymentStatus) -> Result<(), PaymentError> {
        if !self.status.can_transition_to(next) {
            return Err(PaymentError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_record_defaults() {
        let record = PaymentRecord::new("dps");
        assert_eq!(record.status(), PaymentStatus::Incomplete);
        assert_eq!(record.currency().as_str(), "USD");
        assert_eq!(record.amount().amount, dec!(0));
        assert!(record.message.is_none());
    }

    #[test]
    fn test_transition_table() {
        use PaymentStatus::*;
        let all = [Incomplete, Pending, Success, Failure];

        assert!(Incomplete.can_transition_to(Pending));
        assert!(Pending.can_transition_to(Success));
        assert!(Pending.can_transition_to(Incomplete));
        assert!(Pending.can_transition_to(Failure));
        assert!(Incomplete.can_transition_to(Failure));

        assert!(!Incomplete.can_transition_to(Success));
        for next in all {
            assert!(!Success.can_transition_to(next));
            assert!(!Failure.can_transition_to(next));
        }
    }

    #[test]
    fn test_transition_rejects_terminal() {
        let mut record = PaymentRecord::new("dps");
        record.transition(PaymentStatus::Pending).unwrap();
        record.transition(PaymentStatus::Success).unwrap();

        let result = record.transition(PaymentStatus::Success);
        assert!(matches!(
            result,
            Err(PaymentError::InvalidTransition {
                from: PaymentStatus::Success,
                to: PaymentStatus::Success,
                ..
            })
        ));
        assert_eq!(record.status(), PaymentStatus::Success);
    }

    #[test]
    fn test_amount_frozen_once_settled() {
        let mut record = PaymentRecord::new("dps");
        let usd = Currency::new("USD").unwrap();
        record.set_amount(Money::new(dec!(10), usd.clone())).unwrap();
        record.transition(PaymentStatus::Failure).unwrap();

        let result = record.set_amount(Money::new(dec!(20), usd));
        assert!(matches!(result, Err(PaymentError::Validation(_))));
        assert_eq!(record.amount().amount, dec!(10));
    }

    #[test]
    fn test_payment_id_parsing() {
        assert_eq!("42".parse::<PaymentId>().unwrap(), PaymentId(42));
        assert!(matches!(
            "abc".parse::<PaymentId>(),
            Err(PaymentError::UnresolvablePayment(_))
        ));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PaymentStatus::Pending).unwrap();
        assert_eq!(json, "\"Pending\"");
    }
}
