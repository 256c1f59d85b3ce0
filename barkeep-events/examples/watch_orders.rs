//! Subscribes to the admin order channel and prints every event.
//!
//! Usage:
//!   ORDER_EVENTS_REALTIME_ENDPOINT=wss://... ORDER_EVENTS_API_KEY=... \
//!     cargo run -p barkeep-events --example watch_orders

use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use barkeep_core::Channel;
use barkeep_events::{OrderEventCallbacks, OrderEventsClient, OrderEventsConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let endpoint = std::env::var("ORDER_EVENTS_REALTIME_ENDPOINT")
        .context("ORDER_EVENTS_REALTIME_ENDPOINT not set")?;
    let api_key =
        std::env::var("ORDER_EVENTS_API_KEY").context("ORDER_EVENTS_API_KEY not set")?;

    let callbacks = OrderEventCallbacks::new()
        .on_order_created(|order| {
            println!("+ order {} created: {}", order.id, order.drink.name);
        })
        .on_order_status_changed(|order, previous| {
            println!(
                "~ order {} status: {} -> {}",
                order.id,
                previous.map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()),
                order.status
            );
        })
        .on_order_completed(|order| {
            println!("- order {} completed", order.id);
        })
        .on_error(|error| {
            eprintln!("! {}", error);
        });

    let client = OrderEventsClient::subscribe(
        OrderEventsConfig::new(&endpoint, api_key),
        Channel::admin(),
        callbacks,
        true,
    );

    println!("Watching {} (ctrl-c to stop)...", Channel::admin());
    loop {
        tokio::time::sleep(Duration::from_secs(30)).await;
        println!(
            "  [status] connected: {}, last error: {:?}",
            client.is_connected(),
            client.last_error()
        );
    }
}
