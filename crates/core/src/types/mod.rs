//! Core types for the proxy console.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod expiry;
pub mod id;
pub mod inbound;
pub mod panel;
pub mod traffic;

pub use expiry::{ExpiryInput, expiry_from_days, parse_expiry_date, remaining_days};
pub use id::*;
pub use inbound::{InboundSelection, InboundSelectionError};
pub use panel::{Flow, PanelType, Role};
pub use traffic::{BYTES_PER_GB, Traffic, TrafficError};
