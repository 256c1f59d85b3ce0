//! Order data structures for the drink-ordering service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an order
///
/// Orders move pending → in_progress → completed, or get cancelled.
/// The backend owns these transitions; clients only observe them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order placed, waiting to be picked up by the bar
    Pending,
    /// Order is being prepared
    InProgress,
    /// Order has been served
    Completed,
    /// Order was cancelled before completion
    Cancelled,
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl OrderStatus {
    /// Whether the order still needs attention from the bar
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::InProgress)
    }

    /// The wire representation of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "in_progress" => Ok(OrderStatus::InProgress),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// Snapshot of the drink an order refers to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: String,
}

/// A single drink order as the backend reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier assigned by the backend
    pub id: String,

    /// The drink being ordered
    pub drink: DrinkRef,

    /// Opaque session key of the ordering user
    pub user_session_id: String,

    /// Display name, if the user registered one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Current lifecycle status
    pub status: OrderStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Set once the order reaches `completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Counters returned alongside the admin order queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdersMetadata {
    #[serde(default)]
    pub pending_count: u64,
    #[serde(default)]
    pub in_progress_count: u64,
    #[serde(default)]
    pub completed_24h_count: u64,
    /// How many pending orders the queue response actually contained
    #[serde(default)]
    pub pending_returned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"cancelled\"").unwrap(),
            OrderStatus::Cancelled
        );
    }

    #[test]
    fn status_parses_from_wire_strings() {
        assert_eq!("pending".parse::<OrderStatus>().unwrap(), OrderStatus::Pending);
        assert!("served".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn active_statuses() {
        assert!(OrderStatus::Pending.is_active());
        assert!(OrderStatus::InProgress.is_active());
        assert!(!OrderStatus::Completed.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    #[test]
    fn order_deserializes_without_optional_fields() {
        let json = r#"{
            "id": "o1",
            "drink": {"id": "d1", "name": "Negroni", "image_url": ""},
            "user_session_id": "s1",
            "status": "pending",
            "created_at": "2026-01-15T18:00:00Z",
            "updated_at": "2026-01-15T18:00:00Z"
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, "o1");
        assert_eq!(order.drink.name, "Negroni");
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.username.is_none());
        assert!(order.completed_at.is_none());
    }
}
