//! Outbound event fan-out for the transport layer.

pub mod hub;

pub use hub::EventHub;
