//! Core types for the Barkeep order stack
//!
//! This crate defines the shared data structures used across the stack:
//! orders and their lifecycle, the domain events published for them, the
//! realtime channel names, and the common error type.

pub mod channel;
pub mod error;
pub mod event;
pub mod order;

pub use channel::Channel;
pub use error::{BarkeepError, BarkeepResult};
pub use event::{OrderEvent, StatusChange};
pub use order::{DrinkRef, Order, OrderStatus, OrdersMetadata};
