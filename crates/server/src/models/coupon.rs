//! Coupon domain types.

use chrono::{DateTime, Utc};

use clover_core::{CouponCode, CouponId, UserId};

/// A per-user discount coupon.
///
/// Invariant: a user has at most one active coupon. Issuing a new coupon
/// deletes the prior row, and redeeming or expiring one clears `is_active`.
#[derive(Debug, Clone)]
pub struct Coupon {
    /// Unique coupon ID.
    pub id: CouponId,
    /// Redemption code, unique per owner.
    pub code: CouponCode,
    /// Discount in whole percent (1-100).
    pub discount_percent: i32,
    /// When the coupon stops being redeemable.
    pub expires_at: DateTime<Utc>,
    /// Whether the coupon can still be redeemed.
    pub is_active: bool,
    /// Owning user.
    pub user_id: UserId,
}

impl Coupon {
    /// Whether the expiration timestamp has passed.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(expires_at: DateTime<Utc>) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: CouponCode::parse("GIFTAAAAAA").unwrap(),
            discount_percent: 10,
            expires_at,
            is_active: true,
            user_id: UserId::new(1),
        }
    }

    #[test]
    fn test_is_expired() {
        let now = Utc::now();
        assert!(coupon(now - Duration::seconds(1)).is_expired(now));
        assert!(!coupon(now + Duration::days(30)).is_expired(now));
    }
}
