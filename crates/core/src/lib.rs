//! Clover Core - Shared types library.
//!
//! This crate provides common types used across all Clover components:
//! - `server` - Storefront HTTP API
//! - `client` - Typed API client (frontend state mirrors)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, coupon codes,
//!   roles, and payment statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
