//! Application layer: the gateway registry and the payment controller that
//! drives a payment attempt through its lifecycle.

pub mod controller;
pub mod registry;
