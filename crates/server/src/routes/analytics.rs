//! Analytics route handlers.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::analytics::{AnalyticsData, AnalyticsService, DailySales};
use crate::state::AppState;

/// Analytics response: point-in-time totals plus the trailing daily series.
#[derive(Serialize)]
pub struct AnalyticsResponse {
    #[serde(rename = "analyticsData")]
    analytics_data: AnalyticsData,
    #[serde(rename = "dailySalesData")]
    daily_sales_data: Vec<DailySales>,
}

/// Store overview for the admin dashboard.
#[instrument(skip(state))]
pub async fn overview(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<AnalyticsResponse>> {
    let service = AnalyticsService::new(state.pool());

    let analytics_data = service.overview().await?;

    let (start, end) = AnalyticsService::default_window(Utc::now());
    let daily_sales_data = service.daily_sales(start, end).await?;

    Ok(Json(AnalyticsResponse {
        analytics_data,
        daily_sales_data,
    }))
}
