//! Domain model: money, payment records and their lifecycle, checkout and
//! callback payloads, and the storage port.

pub mod checkout;
pub mod money;
pub mod payment;
pub mod ports;
