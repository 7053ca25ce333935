//! Status enums for various entities.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Payment status of a checkout session or order.
///
/// Mirrors the payment gateway's `payment_status` field. An order is only
/// ever created from a session whose status is [`PaymentStatus::Paid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment has not been completed.
    #[default]
    Unpaid,
    /// Payment was completed successfully.
    Paid,
    /// No payment was required (fully discounted session).
    NoPaymentRequired,
}

impl PaymentStatus {
    /// Get the status as its wire/stored string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::NoPaymentRequired => "no_payment_required",
        }
    }

    /// Whether this status settles the session.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "no_payment_required" => Ok(Self::NoPaymentRequired),
            other => Err(UnknownPaymentStatus(other.to_owned())),
        }
    }
}

/// Error returned when parsing an unknown payment status string.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown payment status: {0}")]
pub struct UnknownPaymentStatus(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        for status in [
            PaymentStatus::Unpaid,
            PaymentStatus::Paid,
            PaymentStatus::NoPaymentRequired,
        ] {
            assert_eq!(status.as_str().parse::<PaymentStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_only_paid_settles() {
        assert!(PaymentStatus::Paid.is_paid());
        assert!(!PaymentStatus::Unpaid.is_paid());
        assert!(!PaymentStatus::NoPaymentRequired.is_paid());
    }
}
