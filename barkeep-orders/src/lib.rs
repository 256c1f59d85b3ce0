//! Order data layer for the Barkeep order stack
//!
//! Fetches order snapshots from the REST API and keeps an in-memory order
//! board reconciled against the realtime event stream.

pub mod api;
pub mod board;
pub mod feed;
pub mod guard;

pub use api::{AdminOrders, OrdersApi};
pub use board::OrderBoard;
pub use feed::AdminOrdersFeed;
pub use guard::{InflightGuard, InflightToken};
