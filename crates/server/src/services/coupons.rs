//! Coupon issuance and validation.

use chrono::{Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use clover_core::{CouponCode, CouponCodeError, UserId};

use crate::db::RepositoryError;
use crate::db::coupons::CouponRepository;
use crate::models::Coupon;

/// Discount applied to auto-issued coupons, in percent.
const GIFT_DISCOUNT_PERCENT: i32 = 10;

/// Auto-issued coupons stay redeemable this long.
const GIFT_VALIDITY_DAYS: i64 = 30;

/// Prefix of auto-issued coupon codes.
const GIFT_CODE_PREFIX: &str = "GIFT";

/// Number of random characters appended to the prefix.
const GIFT_CODE_RANDOM_LEN: usize = 6;

/// Errors from coupon operations.
#[derive(Debug, Error)]
pub enum CouponError {
    /// No matching active coupon.
    #[error("coupon not found")]
    NotFound,

    /// The coupon exists but its expiration timestamp has passed.
    #[error("coupon has expired")]
    Expired,

    /// The submitted code is not a valid coupon code.
    #[error("invalid coupon code: {0}")]
    InvalidCode(#[from] CouponCodeError),

    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Coupon service.
pub struct CouponService<'a> {
    coupons: CouponRepository<'a>,
}

impl<'a> CouponService<'a> {
    /// Create a new coupon service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            coupons: CouponRepository::new(pool),
        }
    }

    /// Get the user's active coupon.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::NotFound` if the user has no active coupon.
    pub async fn active_for_user(&self, user_id: UserId) -> Result<Coupon, CouponError> {
        self.coupons
            .active_for_user(user_id)
            .await?
            .ok_or(CouponError::NotFound)
    }

    /// Validate a code for a user.
    ///
    /// An active coupon whose expiration has passed is deactivated on the
    /// spot and reported as [`CouponError::Expired`], distinct from
    /// [`CouponError::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns `CouponError::InvalidCode` for malformed codes,
    /// `CouponError::NotFound` when no active coupon matches, and
    /// `CouponError::Expired` for lapsed coupons.
    pub async fn validate(&self, user_id: UserId, code: &str) -> Result<Coupon, CouponError> {
        let code = CouponCode::parse(code)?;

        let coupon = self
            .coupons
            .active_by_code(user_id, &code)
            .await?
            .ok_or(CouponError::NotFound)?;

        if coupon.is_expired(Utc::now()) {
            self.coupons.deactivate(user_id, &code).await?;
            return Err(CouponError::Expired);
        }

        Ok(coupon)
    }

    /// Deactivate a user's coupon by code. Missing coupons are ignored.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Repository` if the update fails.
    pub async fn deactivate(&self, user_id: UserId, code: &CouponCode) -> Result<(), CouponError> {
        self.coupons.deactivate(user_id, code).await?;
        Ok(())
    }

    /// Issue a fresh gift coupon for a user, replacing any existing coupon.
    ///
    /// # Errors
    ///
    /// Returns `CouponError::Repository` if the replacement fails.
    pub async fn issue_gift(&self, user_id: UserId) -> Result<Coupon, CouponError> {
        let code = generate_gift_code();
        let expires_at = Utc::now() + Duration::days(GIFT_VALIDITY_DAYS);

        let coupon = self
            .coupons
            .replace(user_id, &code, GIFT_DISCOUNT_PERCENT, expires_at)
            .await?;

        info!(user = %user_id, code = %coupon.code, "issued gift coupon");

        Ok(coupon)
    }
}

/// Generate a gift coupon code: `GIFT` followed by 6 random uppercase
/// alphanumerics.
fn generate_gift_code() -> CouponCode {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(GIFT_CODE_RANDOM_LEN)
        .map(|b| (b as char).to_ascii_uppercase())
        .collect();

    let code = format!("{GIFT_CODE_PREFIX}{suffix}");

    // Generated codes are uppercase alphanumeric by construction.
    #[allow(clippy::unwrap_used)]
    CouponCode::parse(&code).unwrap()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_gift_code_shape() {
        for _ in 0..32 {
            let code = generate_gift_code();
            let code = code.as_str();
            assert_eq!(code.len(), GIFT_CODE_PREFIX.len() + GIFT_CODE_RANDOM_LEN);
            assert!(code.starts_with(GIFT_CODE_PREFIX));
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[test]
    fn test_gift_codes_vary() {
        let a = generate_gift_code();
        let b = generate_gift_code();
        // 36^6 possibilities; a collision here means the RNG is broken.
        assert_ne!(a, b);
    }
}
