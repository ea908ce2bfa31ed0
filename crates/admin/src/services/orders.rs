//! Order fulfilment panel.
//!
//! Orders are kept in the operator's session, like settings. A fresh session
//! starts from the sample orders; status, payment and delivery edits stay in
//! that session and are never sent to the backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fulfilment status an operator can assign.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

/// A status name that matches no [`OrderStatus`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.value().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// An order as the fulfilment panel sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrder {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer: String,
    /// Whole rupees.
    pub total: u32,
    pub status: OrderStatus,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl AdminOrder {
    fn sample(id: &str, customer: &str, total: u32, status: OrderStatus) -> Self {
        Self {
            id: id.to_string(),
            customer: customer.to_string(),
            total,
            status,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
        }
    }
}

/// An order id that is not in the book.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("order '{0}' not found")]
pub struct OrderNotFound(pub String);

/// The orders held in one operator's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    orders: Vec<AdminOrder>,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self {
            orders: vec![
                AdminOrder::sample("101", "Amit", 500, OrderStatus::Pending),
                AdminOrder::sample("102", "Priya", 300, OrderStatus::Processing),
                AdminOrder::sample("103", "Rahul", 700, OrderStatus::Shipped),
            ],
        }
    }
}

impl OrderBook {
    #[must_use]
    pub fn orders(&self) -> &[AdminOrder] {
        &self.orders
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut AdminOrder, OrderNotFound> {
        self.orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| OrderNotFound(id.to_string()))
    }

    /// Set the fulfilment status. Payment and delivery flags are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNotFound`] for an unknown id.
    pub fn update_status(&mut self, id: &str, status: OrderStatus) -> Result<(), OrderNotFound> {
        self.find_mut(id)?.status = status;
        Ok(())
    }

    /// Record payment. An order already paid keeps its original time.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNotFound`] for an unknown id.
    pub fn mark_paid(&mut self, id: &str, now: DateTime<Utc>) -> Result<(), OrderNotFound> {
        let order = self.find_mut(id)?;
        if !order.is_paid {
            order.is_paid = true;
            order.paid_at = Some(now);
        }
        Ok(())
    }

    /// Flip the delivered flag, stamping or clearing the delivery time.
    /// Returns whether the order is now delivered.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNotFound`] for an unknown id.
    pub fn toggle_delivered(&mut self, id: &str, now: DateTime<Utc>) -> Result<bool, OrderNotFound> {
        let order = self.find_mut(id)?;
        let delivered = !(order.is_delivered || order.delivered_at.is_some());
        order.is_delivered = delivered;
        order.delivered_at = delivered.then_some(now);
        Ok(delivered)
    }
}
