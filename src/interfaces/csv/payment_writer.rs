use crate::domain::payment::{PaymentId, PaymentRecord, PaymentStatus};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PaymentRow<'a> {
    id: PaymentId,
    gateway: &'a str,
    status: PaymentStatus,
    amount: Decimal,
    currency: &'a str,
    message: Option<&'a str>,
}

/// Writes the final state of payments as CSV.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_payments<'a>(&mut self, payments: impl IntoIterator<Item = &'a PaymentRecord>) -> Result<()> {
        for payment in payments {
            self.writer.serialize(PaymentRow {
                id: payment.id,
                gateway: &payment.gateway,
                status: payment.status(),
                amount: payment.amount().amount,
                currency: payment.currency().as_str(),
                message: payment.message.as_deref(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
