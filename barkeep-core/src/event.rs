//! Domain events published on the realtime order channels
//!
//! The backend publishes one event per order transition. Events are
//! transient: nothing here persists them, consumers own any derived state.

use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderStatus};

/// Payload of an `ORDER_STATUS_CHANGED` event
///
/// The order snapshot plus the status it transitioned away from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    #[serde(flatten)]
    pub order: Order,
    /// Wire status string the order had before this transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<String>,
}

impl StatusChange {
    /// The previous status, if the wire value is a recognized status
    pub fn previous(&self) -> Option<OrderStatus> {
        self.previous_status.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Event envelope published on the order channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderEvent {
    /// A new order was placed
    #[serde(rename = "ORDER_CREATED")]
    OrderCreated { data: Order },
    /// An order moved to a new status
    #[serde(rename = "ORDER_STATUS_CHANGED")]
    OrderStatusChanged { data: StatusChange },
    /// An order was served
    #[serde(rename = "ORDER_COMPLETED")]
    OrderCompleted { data: Order },
}

impl OrderEvent {
    /// The order snapshot carried by this event
    pub fn order(&self) -> &Order {
        match self {
            OrderEvent::OrderCreated { data } => data,
            OrderEvent::OrderStatusChanged { data } => &data.order,
            OrderEvent::OrderCompleted { data } => data,
        }
    }

    /// The previous status, for status-changed events
    pub fn previous_status(&self) -> Option<OrderStatus> {
        match self {
            OrderEvent::OrderStatusChanged { data } => data.previous(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_json(id: &str, status: &str) -> String {
        format!(
            r#"{{
                "id": "{id}",
                "drink": {{"id": "d1", "name": "Spritz", "image_url": ""}},
                "user_session_id": "s1",
                "status": "{status}",
                "created_at": "2026-01-15T18:00:00Z",
                "updated_at": "2026-01-15T18:05:00Z"
            }}"#
        )
    }

    #[test]
    fn created_event_round_trips() {
        let json = format!(r#"{{"type":"ORDER_CREATED","data":{}}}"#, order_json("o1", "pending"));
        let event: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.order().id, "o1");
        assert!(event.previous_status().is_none());
        assert!(matches!(event, OrderEvent::OrderCreated { .. }));
    }

    #[test]
    fn status_changed_carries_previous_status() {
        let mut data: serde_json::Value =
            serde_json::from_str(&order_json("o2", "in_progress")).unwrap();
        data["previous_status"] = "pending".into();
        let json = format!(r#"{{"type":"ORDER_STATUS_CHANGED","data":{}}}"#, data);

        let event: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.order().status, OrderStatus::InProgress);
        assert_eq!(event.previous_status(), Some(OrderStatus::Pending));
    }

    #[test]
    fn unrecognized_previous_status_is_none() {
        let mut data: serde_json::Value =
            serde_json::from_str(&order_json("o3", "in_progress")).unwrap();
        data["previous_status"] = "limbo".into();
        let json = format!(r#"{{"type":"ORDER_STATUS_CHANGED","data":{}}}"#, data);

        let event: OrderEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.previous_status(), None);
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        let json = format!(r#"{{"type":"ORDER_SHAKEN","data":{}}}"#, order_json("o4", "pending"));
        assert!(serde_json::from_str::<OrderEvent>(&json).is_err());
    }
}
