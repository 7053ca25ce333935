//! Payment gateway wire types.

use serde::{Deserialize, Serialize};

use clover_core::PaymentStatus;

/// A hosted checkout session.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Gateway session identifier.
    pub id: String,
    /// Payment status at retrieval time.
    #[serde(default)]
    pub payment_status: PaymentStatus,
    /// Settled total in minor currency units.
    #[serde(default)]
    pub amount_total: i64,
    /// Metadata echoed back from session creation.
    #[serde(default)]
    pub metadata: SessionMetadata,
}

/// Metadata attached at session creation and used to reconcile the order
/// after payment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMetadata {
    /// Buying user's ID.
    #[serde(default)]
    pub user_id: String,
    /// Applied coupon code, empty when none was used.
    #[serde(default)]
    pub coupon_code: String,
    /// JSON-encoded purchased product snapshot.
    #[serde(default)]
    pub products: String,
}

/// One product entry in the metadata snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataProduct {
    pub id: i32,
    pub quantity: i32,
    /// Unit price in major units, as supplied at session creation.
    pub price: rust_decimal::Decimal,
}

/// A gateway line item as returned by the line-items endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItem {
    /// Product name shown on the payment page.
    #[serde(default)]
    pub description: String,
    /// Purchased quantity.
    #[serde(default)]
    pub quantity: i64,
    /// Line subtotal in minor units.
    #[serde(default)]
    pub amount_subtotal: i64,
}

/// Paginated line-item list envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemList {
    pub data: Vec<LineItem>,
}

/// A gateway-side coupon object.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayCoupon {
    pub id: String,
}

/// Error envelope returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details returned by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_deserializes_paid() {
        let json = r#"{
            "id": "cs_test_123",
            "payment_status": "paid",
            "amount_total": 45000,
            "metadata": {
                "user_id": "7",
                "coupon_code": "GIFTAAAAAA",
                "products": "[{\"id\":1,\"quantity\":2,\"price\":\"150.00\"}]"
            }
        }"#;

        let session: CheckoutSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.id, "cs_test_123");
        assert!(session.payment_status.is_paid());
        assert_eq!(session.amount_total, 45000);
        assert_eq!(session.metadata.user_id, "7");

        let products: Vec<MetadataProduct> =
            serde_json::from_str(&session.metadata.products).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].quantity, 2);
    }

    #[test]
    fn test_session_defaults_for_missing_fields() {
        let session: CheckoutSession = serde_json::from_str(r#"{"id": "cs_1"}"#).unwrap();
        assert_eq!(session.payment_status, PaymentStatus::Unpaid);
        assert_eq!(session.amount_total, 0);
        assert!(session.metadata.coupon_code.is_empty());
    }

    #[test]
    fn test_error_envelope() {
        let err: ErrorResponse =
            serde_json::from_str(r#"{"error": {"message": "No such session"}}"#).unwrap();
        assert_eq!(err.error.message, "No such session");
    }
}
