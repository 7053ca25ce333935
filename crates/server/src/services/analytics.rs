//! Sales analytics aggregation.
//!
//! Read-only aggregation over users, products, and orders. The daily series
//! is left-joined in Rust against every calendar day in the window so days
//! with no orders report zeros.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;

use crate::db::orders::{DailySalesRow, OrderRepository};
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::db::RepositoryError;

/// Length of the trailing window served by the analytics endpoint.
pub const DAILY_WINDOW_DAYS: i64 = 7;

/// Errors from analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Database operation failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// The requested window has end before start.
    #[error("invalid date range")]
    InvalidRange,
}

/// Point-in-time store totals.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsData {
    /// Customer-role user count.
    pub users: i64,
    /// Product count.
    pub products: i64,
    #[serde(rename = "totalSales")]
    pub total_sales: i64,
    #[serde(rename = "totalRevenue")]
    pub total_revenue: Decimal,
}

/// One day of the zero-filled daily series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    /// Calendar day (UTC).
    pub date: NaiveDate,
    /// Number of orders placed that day.
    pub sales: i64,
    /// Revenue summed over that day's orders.
    pub revenue: Decimal,
}

/// Analytics service.
pub struct AnalyticsService<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsService<'a> {
    /// Create a new analytics service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Point-in-time counts plus full-table order aggregates.
    ///
    /// An empty order table yields zero sales and revenue.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::Repository` if any query fails.
    pub async fn overview(&self) -> Result<AnalyticsData, AnalyticsError> {
        let users = UserRepository::new(self.pool).count_customers().await?;
        let products = ProductRepository::new(self.pool).count().await?;
        let summary = OrderRepository::new(self.pool).sales_summary().await?;

        Ok(AnalyticsData {
            users,
            products,
            total_sales: summary.total_sales,
            total_revenue: summary.total_revenue,
        })
    }

    /// Orders aggregated per calendar day in `[start, end]`, zero-filled.
    ///
    /// Output contains exactly one entry per day in the window, inclusive of
    /// both endpoints.
    ///
    /// # Errors
    ///
    /// Returns `AnalyticsError::InvalidRange` if `end < start` and
    /// `AnalyticsError::Repository` if the query fails.
    pub async fn daily_sales(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailySales>, AnalyticsError> {
        if end < start {
            return Err(AnalyticsError::InvalidRange);
        }

        let rows = OrderRepository::new(self.pool).daily_sales(start, end).await?;

        Ok(zero_fill(start.date_naive(), end.date_naive(), &rows))
    }

    /// The trailing window served by `GET /api/analytics`.
    #[must_use]
    pub fn default_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - Duration::days(DAILY_WINDOW_DAYS), now)
    }
}

/// Walk every day from `start` to `end` inclusive, pulling aggregates from
/// `rows` where present and zeros elsewhere.
fn zero_fill(start: NaiveDate, end: NaiveDate, rows: &[DailySalesRow]) -> Vec<DailySales> {
    let mut out = Vec::new();
    let mut day = start;

    while day <= end {
        let found = rows.iter().find(|r| r.day == day);
        out.push(DailySales {
            date: day,
            sales: found.map_or(0, |r| r.sales),
            revenue: found.map_or(Decimal::ZERO, |r| r.revenue),
        });

        let Some(next) = day.succ_opt() else {
            break;
        };
        day = next;
    }

    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_zero_fill_covers_every_day() {
        let rows = vec![DailySalesRow {
            day: date("2026-08-02"),
            sales: 3,
            revenue: "450.00".parse().unwrap(),
        }];

        let series = zero_fill(date("2026-08-01"), date("2026-08-03"), &rows);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].date, date("2026-08-01"));
        assert_eq!(series[0].sales, 0);
        assert_eq!(series[0].revenue, Decimal::ZERO);
        assert_eq!(series[1].sales, 3);
        assert_eq!(series[1].revenue, "450.00".parse::<Decimal>().unwrap());
        assert_eq!(series[2].date, date("2026-08-03"));
        assert_eq!(series[2].sales, 0);
    }

    #[test]
    fn test_zero_fill_single_day_window() {
        let series = zero_fill(date("2026-08-01"), date("2026-08-01"), &[]);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].sales, 0);
    }

    #[test]
    fn test_zero_fill_crosses_month_boundary() {
        let series = zero_fill(date("2026-07-30"), date("2026-08-02"), &[]);
        let dates: Vec<NaiveDate> = series.iter().map(|d| d.date).collect();
        assert_eq!(
            dates,
            vec![
                date("2026-07-30"),
                date("2026-07-31"),
                date("2026-08-01"),
                date("2026-08-02"),
            ]
        );
    }

    #[test]
    fn test_default_window_is_seven_days() {
        let now = Utc::now();
        let (start, end) = AnalyticsService::default_window(now);
        assert_eq!(end, now);
        assert_eq!(end - start, Duration::days(7));
    }
}
