//! Domain types shared by the client and the transaction processor.

pub mod address;
pub mod envelope;
pub mod payload;
pub mod ports;
pub mod shipment;
