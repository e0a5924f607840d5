//! Backend test support utilities
//!
//! Shared by the engine's integration tests: unified logging initialization
//! and generators for unique names and card text. Independent of the engine
//! crate.

pub mod card_text;
pub mod logging;
pub mod unique_helpers;
