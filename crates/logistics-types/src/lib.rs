//! Common types module for the logistics back-office system.
//!
//! This module defines the core data types shared by every component:
//! shipment, pickup and purchase records, their closed status enums,
//! tariff rows, history entries and the uniform result shape returned to
//! callers. Keeping them in one crate keeps the storage, pricing and
//! workflow layers agreeing on field names and serialisation.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Status history entries appended on every accepted transition.
pub mod history;
/// Pickup request records.
pub mod pickup;
/// Purchase request records and their cost breakdown.
pub mod purchase;
/// Registry trait for pluggable implementations.
pub mod registry;
/// Shipment records and cargo attributes.
pub mod shipment;
/// Closed status enumerations for every tracked entity.
pub mod status;
/// Storage types for managing persistent data.
pub mod storage;
/// Transport tariff rows and route keys.
pub mod tariff;
/// Utility functions for formatting and time handling.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use api::*;
pub use history::*;
pub use pickup::*;
pub use purchase::*;
pub use registry::ImplementationRegistry;
pub use shipment::*;
pub use status::*;
pub use storage::*;
pub use tariff::*;
pub use utils::{format_money, round_money, truncate_id};
pub use validation::*;
