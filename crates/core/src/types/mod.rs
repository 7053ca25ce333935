//! Core types for Clover.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod coupon;
pub mod email;
pub mod id;
pub mod role;
pub mod status;

pub use coupon::{CouponCode, CouponCodeError};
pub use email::{Email, EmailError};
pub use id::*;
pub use role::Role;
pub use status::PaymentStatus;
