//! Utility functions for formatting and time handling.
//!
//! This module provides helper functions commonly used throughout the
//! logistics system for log formatting and monetary rounding.

pub mod formatting;
pub mod helpers;

pub use formatting::{format_money, truncate_id};
pub use helpers::round_money;
