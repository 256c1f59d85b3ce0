//! Realtime order event client
//!
//! Connects to the managed events endpoint over WebSocket, authenticates
//! with an API key carried in a subprotocol token, subscribes to an order
//! channel, and dispatches typed domain events to consumer callbacks.
//! Abnormal disconnects reconnect with exponential backoff; a visibility
//! regain signal recovers immediately after device sleep.

pub mod auth;
pub mod client;
pub mod protocol;
pub mod state;

pub use auth::{Authorization, EventsAuth, EVENT_STREAM_PROTOCOL};
pub use client::{
    ErrorCallback, OrderCallback, OrderEventCallbacks, OrderEventsClient, OrderEventsConfig,
    StatusChangedCallback,
};
pub use state::{ConnectionPhase, RetryPolicy};
