//! Command result taxonomy for the session engine.

pub mod status_code;

pub use status_code::StatusCode;
