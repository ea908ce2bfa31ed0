//! Checkout stages and shipping details.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::OrderId;

/// Where a checkout currently stands.
///
/// Exactly one step is active at a time; the storefront renders the step
/// that matches the stage.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "stage", content = "order_id", rename_all = "snake_case")]
pub enum CheckoutStage {
    /// No checkout in progress.
    #[default]
    Idle,
    /// Waiting for the buyer's name.
    NeedName,
    /// Waiting for the buyer's email (a one-time code is sent on submit).
    NeedEmail,
    /// Waiting for the one-time code.
    NeedOtp,
    /// Identity confirmed, waiting for the shipping address.
    NeedShipping,
    /// A pending order exists and the gateway widget is open.
    PaymentInFlight(OrderId),
    /// Payment verified; the cart has been cleared.
    Completed(OrderId),
}

impl CheckoutStage {
    /// Short name for logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::NeedName => "need_name",
            Self::NeedEmail => "need_email",
            Self::NeedOtp => "need_otp",
            Self::NeedShipping => "need_shipping",
            Self::PaymentInFlight(_) => "payment_in_flight",
            Self::Completed(_) => "completed",
        }
    }
}

impl fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the buyer pays. Only the hosted gateway is offered today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Razorpay,
}

/// A required shipping field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingField {
    FullName,
    Address,
    City,
    PostalCode,
    Country,
}

impl ShippingField {
    /// Label shown next to the form input.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullName => "Full name",
            Self::Address => "Address",
            Self::City => "City",
            Self::PostalCode => "Postal code",
            Self::Country => "Country",
        }
    }
}

/// Shipping address collected at checkout.
///
/// Every field except `phone` is required; the only validation is that
/// required fields are not blank.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl ShippingInfo {
    /// Required fields that are blank after trimming, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<ShippingField> {
        [
            (ShippingField::FullName, &self.full_name),
            (ShippingField::Address, &self.address),
            (ShippingField::City, &self.city),
            (ShippingField::PostalCode, &self.postal_code),
            (ShippingField::Country, &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Whether every required field is filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Copy with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            postal_code: self.postal_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
            phone: self.phone.trim().to_owned(),
            payment_method: self.payment_method,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete() -> ShippingInfo {
        ShippingInfo {
            full_name: "Asha Rao".to_string(),
            address: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            postal_code: "411001".to_string(),
            country: "India".to_string(),
            phone: String::new(),
            payment_method: PaymentMethod::Razorpay,
        }
    }

    #[test]
    fn test_phone_is_optional() {
        assert!(complete().is_complete());
    }

    #[test]
    fn test_blank_required_fields_are_reported_in_order() {
        let info = ShippingInfo {
            city: "  ".to_string(),
            country: String::new(),
            ..complete()
        };
        assert_eq!(
            info.missing_fields(),
            vec![ShippingField::City, ShippingField::Country]
        );
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let json = serde_json::to_value(complete()).unwrap();
        assert_eq!(json["fullName"], "Asha Rao");
        assert_eq!(json["postalCode"], "411001");
        assert_eq!(json["paymentMethod"], "razorpay");
    }

    #[test]
    fn test_stage_round_trips_through_json() {
        let stage = CheckoutStage::PaymentInFlight(OrderId::new("o1"));
        let json = serde_json::to_string(&stage).unwrap();
        assert_eq!(serde_json::from_str::<CheckoutStage>(&json).unwrap(), stage);
        assert_eq!(stage.name(), "payment_in_flight");
    }
}
