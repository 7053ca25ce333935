//! Business services.
//!
//! Services own the domain logic; route handlers stay thin and translate
//! between HTTP and service calls.

pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod coupons;
pub mod images;
