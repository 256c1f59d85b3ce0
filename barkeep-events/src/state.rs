//! Connection lifecycle states and the reconnect policy

use std::time::Duration;

/// Lifecycle state of the realtime connection
///
/// `Disconnected → Connecting → Connected → Subscribing → Subscribed`,
/// with `Closing` on the way back down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No socket; either idle, backing off, or parked for good
    Disconnected,
    /// TCP/TLS and WebSocket handshake in progress
    Connecting,
    /// Socket open and `connection_init` sent, ack not yet received
    Connected,
    /// Ack received, `subscribe` frame sent
    Subscribing,
    /// Subscription confirmed; events dispatch from here on
    Subscribed,
    /// Close initiated, socket not yet gone
    Closing,
}

impl Default for ConnectionPhase {
    fn default() -> Self {
        ConnectionPhase::Disconnected
    }
}

impl ConnectionPhase {
    /// Whether the connection has been acknowledged by the server
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionPhase::Subscribing | ConnectionPhase::Subscribed)
    }

    /// Whether domain events may be dispatched in this phase
    pub fn can_dispatch(&self) -> bool {
        matches!(self, ConnectionPhase::Subscribed)
    }
}

/// Exponential backoff policy for reconnect attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub base: Duration,
    /// Ceiling on the computed delay
    pub cap: Duration,
    /// Retries allowed before the client parks disconnected
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before reconnect attempt number `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.cap)
    }

    /// Whether the attempt counter has hit the ceiling
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
