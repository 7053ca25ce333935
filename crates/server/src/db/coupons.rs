//! Coupon repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clover_core::{CouponCode, CouponId, UserId};

use super::RepositoryError;
use crate::models::Coupon;

/// Raw `coupons` row.
#[derive(sqlx::FromRow)]
struct CouponRow {
    id: i32,
    code: String,
    discount_percent: i32,
    expires_at: DateTime<Utc>,
    is_active: bool,
    user_id: i32,
}

impl CouponRow {
    fn into_coupon(self) -> Result<Coupon, RepositoryError> {
        let code = CouponCode::parse(&self.code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid coupon code in database: {e}"))
        })?;

        Ok(Coupon {
            id: CouponId::new(self.id),
            code,
            discount_percent: self.discount_percent,
            expires_at: self.expires_at,
            is_active: self.is_active,
            user_id: UserId::new(self.user_id),
        })
    }
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's active coupon, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount_percent, expires_at, is_active, user_id
            FROM coupons
            WHERE user_id = $1 AND is_active
            ",
        )
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(CouponRow::into_coupon).transpose()
    }

    /// Get the user's active coupon matching a code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_by_code(
        &self,
        user_id: UserId,
        code: &CouponCode,
    ) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(
            r"
            SELECT id, code, discount_percent, expires_at, is_active, user_id
            FROM coupons
            WHERE user_id = $1 AND code = $2 AND is_active
            ",
        )
        .bind(user_id.as_i32())
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(CouponRow::into_coupon).transpose()
    }

    /// Clear the active flag on a coupon matched by owner and code.
    ///
    /// Returns `true` if a coupon was deactivated.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate(
        &self,
        user_id: UserId,
        code: &CouponCode,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE coupons SET is_active = FALSE WHERE user_id = $1 AND code = $2",
        )
        .bind(user_id.as_i32())
        .bind(code.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the user's coupon: delete any existing row, then insert the
    /// new one. Runs in a transaction so the single-active-coupon invariant
    /// holds even against concurrent issuance.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either statement fails.
    pub async fn replace(
        &self,
        user_id: UserId,
        code: &CouponCode,
        discount_percent: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<Coupon, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM coupons WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(&mut *tx)
            .await?;

        let row = sqlx::query_as::<_, CouponRow>(
            r"
            INSERT INTO coupons (code, discount_percent, expires_at, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, discount_percent, expires_at, is_active, user_id
            ",
        )
        .bind(code.as_str())
        .bind(discount_percent)
        .bind(expires_at)
        .bind(user_id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_coupon()
    }
}
