//! Order repository for database operations.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use clover_core::{OrderId, PaymentStatus, UserId};

use super::RepositoryError;
use crate::models::OrderItem;

/// Result of recording an order for a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedOrder {
    /// ID of the order for this session.
    pub order_id: OrderId,
    /// Whether this call inserted the order. `false` means the session was
    /// already confirmed earlier and the existing order was returned.
    pub newly_created: bool,
}

/// Aggregate totals over the whole `orders` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_revenue: Decimal,
}

/// One day's worth of order aggregates.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DailySalesRow {
    pub day: NaiveDate,
    pub sales: i64,
    pub revenue: Decimal,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record an order for a confirmed checkout session.
    ///
    /// Idempotent per session: the `ON CONFLICT DO NOTHING` insert plus the
    /// unique constraint on `checkout_session_id` guarantee at most one order
    /// per session. When the order already exists, its ID is returned with
    /// `newly_created = false` and no line items are written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    /// Returns `RepositoryError::DataCorruption` if a conflicting row
    /// vanished mid-transaction.
    pub async fn record(
        &self,
        user_id: UserId,
        total_amount: Decimal,
        checkout_session_id: &str,
        payment_status: PaymentStatus,
        items: &[OrderItem],
    ) -> Result<RecordedOrder, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO orders (user_id, total_amount, checkout_session_id, payment_status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (checkout_session_id) DO NOTHING
            RETURNING id
            ",
        )
        .bind(user_id.as_i32())
        .bind(total_amount)
        .bind(checkout_session_id)
        .bind(payment_status.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order_id) = inserted else {
            // Session already confirmed; hand back the existing order.
            let existing = sqlx::query_scalar::<_, i32>(
                "SELECT id FROM orders WHERE checkout_session_id = $1",
            )
            .bind(checkout_session_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order for session {checkout_session_id} disappeared during insert"
                ))
            })?;

            tx.commit().await?;
            return Ok(RecordedOrder {
                order_id: OrderId::new(existing),
                newly_created: false,
            });
        };

        for item in items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, name, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(order_id)
            .bind(item.product_id.as_i32())
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(RecordedOrder {
            order_id: OrderId::new(order_id),
            newly_created: true,
        })
    }

    /// Total order count and summed revenue over all orders.
    ///
    /// An empty table yields zeros, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_summary(&self) -> Result<SalesSummary, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct SummaryRow {
            total_sales: i64,
            total_revenue: Decimal,
        }

        let row = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT COUNT(*) AS total_sales,
                   COALESCE(SUM(total_amount), 0) AS total_revenue
            FROM orders
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(SalesSummary {
            total_sales: row.total_sales,
            total_revenue: row.total_revenue,
        })
    }

    /// Per-day order aggregates within a window, ordered by day.
    ///
    /// Days with no orders produce no row here; the analytics service
    /// zero-fills the gaps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn daily_sales(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailySalesRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, DailySalesRow>(
            r"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day,
                   COUNT(*) AS sales,
                   COALESCE(SUM(total_amount), 0) AS revenue
            FROM orders
            WHERE created_at >= $1 AND created_at <= $2
            GROUP BY day
            ORDER BY day
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
