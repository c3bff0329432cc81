//! Subscription keys and routes.
//!
//! A key is either an exact `type` match or a prefix match. Prefix is a
//! first-class variant; the `"KEY_*"` string form is only a conversion
//! convenience, so a literal trailing `*` can still be expressed with
//! `SubscriptionKey::exact`.

use std::fmt;

/// Marker that turns a string key into a prefix key.
pub const PREFIX_MARKER: char = '*';

/// One subscription key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    /// Matches envelopes whose `type` equals the string.
    Exact(String),
    /// Matches envelopes whose `type` starts with the string.
    Prefix(String),
}

impl SubscriptionKey {
    pub fn exact(key: impl Into<String>) -> Self {
        SubscriptionKey::Exact(key.into())
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        SubscriptionKey::Prefix(prefix.into())
    }

    /// Parse the string convention: a trailing `*` means prefix.
    pub fn parse(key: &str) -> Self {
        match key.strip_suffix(PREFIX_MARKER) {
            Some(prefix) => SubscriptionKey::Prefix(prefix.to_string()),
            None => SubscriptionKey::Exact(key.to_string()),
        }
    }

    /// True when an envelope of type `msg_type` is routed to this key.
    pub fn matches(&self, msg_type: &str) -> bool {
        match self {
            SubscriptionKey::Exact(k) => k == msg_type,
            SubscriptionKey::Prefix(p) => msg_type.starts_with(p.as_str()),
        }
    }
}

impl From<&str> for SubscriptionKey {
    fn from(key: &str) -> Self {
        SubscriptionKey::parse(key)
    }
}

impl From<String> for SubscriptionKey {
    fn from(key: String) -> Self {
        SubscriptionKey::parse(&key)
    }
}

/// What a handler listens to: everything, or a set of keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topics {
    /// Wildcard: every successfully decoded envelope.
    All,
    Keys(Vec<SubscriptionKey>),
}

impl From<SubscriptionKey> for Topics {
    fn from(key: SubscriptionKey) -> Self {
        Topics::Keys(vec![key])
    }
}

impl From<&str> for Topics {
    fn from(key: &str) -> Self {
        Topics::Keys(vec![SubscriptionKey::parse(key)])
    }
}

impl From<Vec<SubscriptionKey>> for Topics {
    fn from(keys: Vec<SubscriptionKey>) -> Self {
        Topics::Keys(keys)
    }
}

impl From<Vec<&str>> for Topics {
    fn from(keys: Vec<&str>) -> Self {
        Topics::Keys(keys.into_iter().map(SubscriptionKey::parse).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Topics {
    fn from(keys: [&str; N]) -> Self {
        Topics::Keys(keys.into_iter().map(SubscriptionKey::parse).collect())
    }
}

impl<T: Into<Topics>> From<Option<T>> for Topics {
    /// `None` is the wildcard.
    fn from(keys: Option<T>) -> Self {
        keys.map(Into::into).unwrap_or(Topics::All)
    }
}

/// Internal index key. One handler set per route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum Route {
    Exact(String),
    Prefix(String),
    Wildcard,
}

impl From<SubscriptionKey> for Route {
    /// An empty prefix (`"*"`) matches everything, so it is the wildcard route.
    fn from(key: SubscriptionKey) -> Self {
        match key {
            SubscriptionKey::Exact(k) => Route::Exact(k),
            SubscriptionKey::Prefix(p) if p.is_empty() => Route::Wildcard,
            SubscriptionKey::Prefix(p) => Route::Prefix(p),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Exact(k) => f.write_str(k),
            Route::Prefix(p) => write!(f, "{p}{PREFIX_MARKER}"),
            Route::Wildcard => f.write_str("<wildcard>"),
        }
    }
}
