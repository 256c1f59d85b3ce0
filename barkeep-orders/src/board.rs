//! In-memory reconciliation of the order queue
//!
//! The board holds the last fetched snapshot and applies realtime events
//! on top of it. Application is idempotent per order id: a reconnect can
//! replay or skip events, so duplicates must be no-ops and updates for
//! unseen orders are upserted rather than dropped.

use tracing::debug;

use barkeep_core::{Order, OrderEvent, OrderStatus, OrdersMetadata};

/// Live view of the admin order queue
#[derive(Debug, Clone, Default)]
pub struct OrderBoard {
    orders: Vec<Order>,
    metadata: OrdersMetadata,
}

impl OrderBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn metadata(&self) -> &OrdersMetadata {
        &self.metadata
    }

    /// Whether any order still needs attention
    pub fn has_active(&self) -> bool {
        self.orders.iter().any(|o| o.status.is_active())
    }

    /// Replace the board with a freshly fetched snapshot
    pub fn replace_all(&mut self, orders: Vec<Order>, metadata: OrdersMetadata) {
        self.orders = orders;
        self.metadata = metadata;
    }

    /// Insert or replace an order by id, without touching the counters
    ///
    /// Used for optimistic local updates after a direct API call; the
    /// realtime event for the same change arrives later and is absorbed
    /// by the same id-keyed replacement.
    pub fn upsert(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
    }

    /// Apply a realtime event to the board
    pub fn apply(&mut self, event: OrderEvent) {
        match event {
            OrderEvent::OrderCreated { data } => self.apply_created(data),
            OrderEvent::OrderStatusChanged { data } => {
                let previous = data.previous();
                self.apply_status_changed(data.order, previous);
            }
            OrderEvent::OrderCompleted { data } => self.apply_completed(data),
        }
    }

    pub fn apply_created(&mut self, order: Order) {
        if self.orders.iter().any(|o| o.id == order.id) {
            debug!("order {} already on the board, ignoring duplicate", order.id);
            return;
        }
        self.orders.push(order);
        self.metadata.pending_count += 1;
        self.metadata.pending_returned += 1;
    }

    pub fn apply_status_changed(&mut self, order: Order, previous: Option<OrderStatus>) {
        match previous {
            Some(OrderStatus::Pending) => {
                self.metadata.pending_count = self.metadata.pending_count.saturating_sub(1);
                self.metadata.pending_returned =
                    self.metadata.pending_returned.saturating_sub(1);
            }
            Some(OrderStatus::InProgress) => {
                self.metadata.in_progress_count =
                    self.metadata.in_progress_count.saturating_sub(1);
            }
            _ => {}
        }
        match order.status {
            OrderStatus::Pending => {
                self.metadata.pending_count += 1;
                self.metadata.pending_returned += 1;
            }
            OrderStatus::InProgress => self.metadata.in_progress_count += 1,
            _ => {}
        }
        self.upsert(order);
    }

    /// Completed orders leave the queue; the queue shows active orders only
    ///
    /// Counters shift only when the order was still on the board, so a
    /// replayed completion cannot drain the count of another order.
    pub fn apply_completed(&mut self, order: Order) {
        let before = self.orders.len();
        self.orders.retain(|o| o.id != order.id);
        if self.orders.len() == before {
            debug!("order {} not on the board, ignoring completion", order.id);
            return;
        }
        self.metadata.in_progress_count = self.metadata.in_progress_count.saturating_sub(1);
        self.metadata.completed_24h_count += 1;
    }
}
