use crate::domain::checkout::CheckoutData;
use crate::domain::money::Money;
use crate::domain::payment::PaymentId;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const CARD_HOLDER_NAME: &str = "CardHolderName";
pub const CARD_NUMBER: &str = "CardNumber";
pub const DATE_EXPIRY: &str = "DateExpiry";
pub const CVN: &str = "Cvc2";

/// Card details collected on the merchant's own checkout form.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDetails {
    pub holder_name: String,
    /// Digits only.
    pub number: String,
    pub expiry_month: u8,
    pub expiry_year: u8,
    pub cvn: Option<String>,
}

impl CardDetails {
    /// Reads and validates card fields from checkout input.
    pub fn from_checkout(checkout: &CheckoutData, cvn_required: bool) -> Result<Self> {
        let holder_name = checkout
            .field(CARD_HOLDER_NAME)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| invalid("card holder name is required"))?
            .to_string();

        let number: String = checkout
            .field(CARD_NUMBER)
            .ok_or_else(|| invalid("card number is required"))?
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if !(12..=19).contains(&number.len()) || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("card number must be 12 to 19 digits"));
        }
        if !luhn_valid(&number) {
            return Err(invalid("card number failed checksum"));
        }

        let (expiry_month, expiry_year) = parse_expiry(
            checkout
                .field(DATE_EXPIRY)
                .ok_or_else(|| invalid("card expiry is required"))?,
        )?;

        let cvn = match checkout.field(CVN).map(str::trim).filter(|s| !s.is_empty()) {
            Some(cvn) if (3..=4).contains(&cvn.len()) && cvn.chars().all(|c| c.is_ascii_digit()) => {
                Some(cvn.to_string())
            }
            Some(_) => return Err(invalid("card CVN must be 3 or 4 digits")),
            None if cvn_required => return Err(invalid("card CVN is required")),
            None => None,
        };

        Ok(Self {
            holder_name,
            number,
            expiry_month,
            expiry_year,
            cvn,
        })
    }

    /// Last four digits, safe to log.
    pub fn masked(&self) -> String {
        let tail = &self.number[self.number.len() - 4..];
        format!("****{}", tail)
    }
}

fn invalid(msg: &str) -> PaymentError {
    PaymentError::GatewayRequest(msg.to_string())
}

/// Parses an `MMYY` expiry.
fn parse_expiry(raw: &str) -> Result<(u8, u8)> {
    let raw = raw.trim();
    if raw.len() != 4 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid("card expiry must be MMYY"));
    }
    let month: u8 = raw[..2].parse().map_err(|_| invalid("card expiry must be MMYY"))?;
    let year: u8 = raw[2..].parse().map_err(|_| invalid("card expiry must be MMYY"))?;
    if !(1..=12).contains(&month) {
        return Err(invalid("card expiry month must be 01 to 12"));
    }
    Ok((month, year))
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// A charge submitted to a merchant-hosted gateway API.
#[derive(Debug, Clone)]
pub struct CardCharge {
    pub payment_id: PaymentId,
    pub amount: Money,
    pub card: CardDetails,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportReply {
    Approved { reference: String },
    Declined { reason: String },
}

/// Outbound connection to a card gateway's API.
#[async_trait]
pub trait CardTransport: Send + Sync {
    async fn submit(&self, charge: &CardCharge) -> Result<TransportReply>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatedBehavior {
    #[default]
    Approve,
    Decline,
    /// Never answers; exercises the request timeout.
    Timeout,
}

/// Stand-in card gateway for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct SimulatedCardTransport {
    pub behavior: SimulatedBehavior,
}

impl SimulatedCardTransport {
    pub fn new(behavior: SimulatedBehavior) -> Self {
        Self { behavior }
    }
}

#[async_trait]
impl CardTransport for SimulatedCardTransport {
    async fn submit(&self, charge: &CardCharge) -> Result<TransportReply> {
        match self.behavior {
            SimulatedBehavior::Approve => Ok(TransportReply::Approved {
                reference: format!("sim-{}-{}", charge.payment_id, charge.card.masked()),
            }),
            SimulatedBehavior::Decline => Ok(TransportReply::Declined {
                reason: "simulated decline".to_string(),
            }),
            SimulatedBehavior::Timeout => std::future::pending().await,
        }
    }
}
