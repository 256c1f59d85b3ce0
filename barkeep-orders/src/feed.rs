//! Live admin order queue
//!
//! Combines a REST snapshot with the realtime event stream: fetch the
//! queue once, then keep the board current from events. The event
//! subscription starts disabled and is enabled only after the first
//! fetch attempt, so events never race an empty board.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use barkeep_core::{BarkeepError, Channel, Order, OrderStatus, OrdersMetadata};
use barkeep_events::{OrderEventCallbacks, OrderEventsClient, OrderEventsConfig};

use crate::api::OrdersApi;
use crate::board::OrderBoard;
use crate::guard::InflightGuard;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Admin order queue kept current over REST and realtime events
#[derive(Debug, Clone)]
pub struct AdminOrdersFeed {
    api: OrdersApi,
    board: Arc<Mutex<OrderBoard>>,
    guard: InflightGuard,
    events: OrderEventsClient,
}

impl AdminOrdersFeed {
    /// Build the feed and spawn its (initially disabled) event subscription
    pub fn new(api: OrdersApi, events_config: OrderEventsConfig) -> Self {
        let board = Arc::new(Mutex::new(OrderBoard::new()));

        let callbacks = {
            let created = Arc::clone(&board);
            let changed = Arc::clone(&board);
            let completed = Arc::clone(&board);
            OrderEventCallbacks::new()
                .on_order_created(move |order| lock(&created).apply_created(order))
                .on_order_status_changed(move |order, previous| {
                    lock(&changed).apply_status_changed(order, previous)
                })
                .on_order_completed(move |order| lock(&completed).apply_completed(order))
                .on_error(|e| warn!("order event stream error: {}", e))
        };

        let events = OrderEventsClient::subscribe(events_config, Channel::admin(), callbacks, false);

        Self {
            api,
            board,
            guard: InflightGuard::new(),
            events,
        }
    }

    /// Fetch the initial snapshot and start the event stream
    pub async fn load(&self) -> Result<(), BarkeepError> {
        self.fetch(false).await
    }

    /// Re-fetch the snapshot even if another fetch is already out
    pub async fn refetch(&self) -> Result<(), BarkeepError> {
        self.fetch(true).await
    }

    async fn fetch(&self, force: bool) -> Result<(), BarkeepError> {
        let token = self.guard.begin();
        if token.is_none() && !force {
            debug!("fetch already in flight, skipping");
            return Ok(());
        }
        let _token = token;

        let result = self.api.admin_orders().await;

        // The stream comes up whether or not the fetch succeeded, so a
        // transient API failure does not also cost us realtime updates.
        self.events.set_enabled(true).await;

        let snapshot = result?;
        lock(&self.board).replace_all(snapshot.orders, snapshot.metadata);
        Ok(())
    }

    /// Move an order to a new status and reflect it locally right away
    ///
    /// Only the order itself is replaced; the counters belong to the
    /// realtime event for the same change, which arrives shortly after
    /// and lands on the already-updated order.
    pub async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
    ) -> Result<Order, BarkeepError> {
        let order = self.api.update_order_status(id, status).await?;
        lock(&self.board).upsert(order.clone());
        Ok(order)
    }

    pub fn orders(&self) -> Vec<Order> {
        lock(&self.board).orders().to_vec()
    }

    pub fn metadata(&self) -> OrdersMetadata {
        lock(&self.board).metadata().clone()
    }

    /// Whether any order on the board still needs attention
    pub fn has_active(&self) -> bool {
        lock(&self.board).has_active()
    }

    /// Whether the realtime stream is up
    pub fn is_connected(&self) -> bool {
        self.events.is_connected()
    }

    /// The most recent stream error, if any
    pub fn last_error(&self) -> Option<String> {
        self.events.last_error()
    }

    /// Forward a visibility regain to the event stream and re-sync
    ///
    /// Events published while the surface was hidden are gone, so the
    /// snapshot is fetched again alongside the reconnect.
    pub async fn notify_visible(&self) -> Result<(), BarkeepError> {
        self.events.notify_visible().await;
        self.fetch(false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barkeep_events::RetryPolicy;
    use std::time::Duration;

    fn feed() -> AdminOrdersFeed {
        // Nothing listens on this port; fetches fail fast with a network
        // error, which is all these tests need.
        let api = OrdersApi::new("http://127.0.0.1:1", "key");
        let config = OrderEventsConfig::new("ws://127.0.0.1:1/event/realtime", "key").with_retry(
            RetryPolicy {
                base: Duration::from_millis(10),
                cap: Duration::from_millis(20),
                max_attempts: 1,
            },
        );
        AdminOrdersFeed::new(api, config)
    }

    #[tokio::test]
    async fn failed_fetch_releases_the_guard() {
        let feed = feed();

        assert!(feed.load().await.is_err());
        assert!(!feed.guard.in_flight());

        // A second attempt is admitted again rather than skipped.
        assert!(feed.refetch().await.is_err());
    }

    #[tokio::test]
    async fn board_starts_empty() {
        let feed = feed();
        assert!(feed.orders().is_empty());
        assert!(!feed.has_active());
        assert_eq!(feed.metadata(), OrdersMetadata::default());
    }
}
