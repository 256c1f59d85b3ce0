//! Realtime channel names for order events

use std::fmt;

/// A named topic on the realtime event service
///
/// One channel broadcasts every order to the admin surface; each user gets
/// a private channel keyed by their opaque session key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Broadcast channel for the admin order queue
    Admin,
    /// Per-user channel, keyed by the opaque user key
    User(String),
}

impl Channel {
    pub fn admin() -> Self {
        Channel::Admin
    }

    pub fn user(key: impl Into<String>) -> Self {
        Channel::User(key.into())
    }

    /// Build a user channel only when a non-empty key is at hand
    ///
    /// Mirrors how consumers gate the subscription on having a key at all.
    pub fn for_user_key(key: Option<&str>) -> Option<Self> {
        match key {
            Some(k) if !k.is_empty() => Some(Channel::User(k.to_string())),
            _ => None,
        }
    }

    /// The wire name of this channel
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Admin => f.write_str("/orders/admin"),
            Channel::User(key) => write!(f, "/orders/user/{}", key),
        }
    }
}
