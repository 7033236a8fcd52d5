//! Proxy console library.
//!
//! Talks to the console backend over REST and, for client management,
//! directly to the upstream 3x-ui / tx-ui panels.
//!
//! # Layout
//!
//! - [`config`] - environment configuration
//! - [`api`] - typed backend client
//! - [`pages`] - list, dialog and settings state holders
//! - [`panels`] - upstream panel clients
//! - [`tasks`] - per-admin client management

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod pages;
pub mod panels;
pub mod tasks;

pub use api::{ApiError, ConsoleClient};
pub use config::{ConfigError, ConsoleConfig, Credentials};
pub use error::ConsoleError;
