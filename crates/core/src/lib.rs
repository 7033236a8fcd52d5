//! Proxy Console Core - Shared types library.
//!
//! This crate provides the types used across all proxy console components:
//! - `admin` - Console API client, page state and upstream panel clients
//! - `cli` - Command-line front end for operators
//!
//! # Architecture
//!
//! The core crate contains only types, arithmetic and validation - no I/O,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, panel types, traffic and expiry arithmetic
//! - [`models`] - Records mirrored from the console backend
//! - [`forms`] - Form schemas with client-side validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod forms;
pub mod models;
pub mod types;

pub use forms::{FieldError, ValidationErrors};
pub use models::*;
pub use types::*;
