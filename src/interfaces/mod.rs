//! Outer surfaces: CSV event input, CSV payment report, and the replay driver
//! that stands in for the web layer.

pub mod csv;
pub mod replay;
