//! Request and response bodies for the merchant backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use navdana_core::{CartLine, OrderId, ProductId, ShippingInfo};

use crate::models::StoredUser;

/// Responses may arrive bare or wrapped as `{ "data": ... }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } | Self::Bare(data) => data,
        }
    }
}

/// Error body the backend sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// OTP
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SendOtpRequest<'a> {
    pub email: &'a str,
}

/// Body of `POST /user/verify`. `token` is sent as `null` when absent.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub name: String,
    pub email: String,
    pub otp: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpResponse {
    pub user: StoredUser,
    pub token: String,
}

// =============================================================================
// Orders
// =============================================================================

/// One order line, with absent optionals sent as `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub product: ProductId,
    pub name: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub size: String,
    pub color: String,
    pub sku: String,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product: line.product_id.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
            size: line.size.clone().unwrap_or_default(),
            color: line.color.clone().unwrap_or_default(),
            sku: line.sku.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderRef {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
}

/// The gateway-side order the widget is opened against.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in the currency's minor unit (paise).
    pub amount: u64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    #[serde(default)]
    pub order: Option<OrderRef>,
    #[serde(default)]
    pub razorpay_order: Option<GatewayOrder>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Proof of payment returned by the widget's success handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    pub razorpay_payment_id: String,
    pub razorpay_order_id: String,
    pub razorpay_signature: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyPaymentRequest {
    #[serde(flatten)]
    pub proof: PaymentProof,
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyPaymentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl Product {
    /// First image, or an empty string.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_envelope_accepts_both_shapes() {
        let bare: Envelope<Vec<u32>> = serde_json::from_value(json!([1, 2])).unwrap();
        let wrapped: Envelope<Vec<u32>> = serde_json::from_value(json!({"data": [1, 2]})).unwrap();
        assert_eq!(bare.into_inner(), wrapped.into_inner());
    }

    #[test]
    fn test_order_item_blanks_absent_optionals() {
        let line = CartLine {
            product_id: ProductId::new("P1"),
            size: Some("M".to_string()),
            color: None,
            sku: None,
            name: "Kurta".to_string(),
            price: Decimal::new(500, 0),
            quantity: 2,
            image: String::new(),
        };
        let json = serde_json::to_value(OrderItem::from(&line)).unwrap();
        assert_eq!(
            json,
            json!({
                "product": "P1",
                "name": "Kurta",
                "quantity": 2,
                "price": 500.0,
                "size": "M",
                "color": "",
                "sku": ""
            })
        );
    }

    #[test]
    fn test_verify_otp_sends_null_token() {
        let body = VerifyOtpRequest {
            name: "Asha".to_string(),
            email: "a@x.in".to_string(),
            otp: "1234".to_string(),
            token: None,
        };
        let json = serde_json::to_value(body).unwrap();
        assert!(json["token"].is_null());
    }

    #[test]
    fn test_verify_payment_body_shape() {
        let body = VerifyPaymentRequest {
            proof: PaymentProof {
                razorpay_payment_id: "pay_1".to_string(),
                razorpay_order_id: "order_1".to_string(),
                razorpay_signature: "sig".to_string(),
            },
            order_id: OrderId::new("o1"),
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["razorpay_payment_id"], "pay_1");
        assert_eq!(json["orderId"], "o1");
    }

    #[test]
    fn test_create_order_response_tolerates_missing_parts() {
        let resp: CreateOrderResponse =
            serde_json::from_value(json!({"order": {"_id": "o1"}})).unwrap();
        assert!(resp.razorpay_order.is_none());
        assert!(resp.key.is_none());
    }

    #[test]
    fn test_product_price_accepts_numbers() {
        let product: Product =
            serde_json::from_value(json!({"_id": "P1", "name": "Kurta", "price": 1299})).unwrap();
        assert_eq!(product.price, Decimal::new(1299, 0));
        assert_eq!(product.primary_image(), "");
    }
}
