use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::lock;

type Registry<V> = Arc<Mutex<HashMap<String, watch::Receiver<Option<V>>>>>;

/// Registry of in-flight fetches keyed by cache key.
///
/// The first caller to [`claim`](Self::claim) a key becomes the leader; later
/// callers become followers until the leader completes or is dropped.
#[derive(Debug)]
pub struct SingleFlight<V> {
    inflight: Registry<V>,
}

impl<V> Default for SingleFlight<V> {
    fn default() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

/// Result of claiming a key.
#[derive(Debug)]
pub enum Flight<V> {
    /// This caller must produce the value.
    Leader(FlightLeader<V>),
    /// Another caller is already producing the value.
    Follower(FlightFollower<V>),
}

/// Leadership over one key. Releases the key on drop.
#[derive(Debug)]
pub struct FlightLeader<V> {
    key: String,
    tx: watch::Sender<Option<V>>,
    registry: Registry<V>,
}

/// Waiter attached to another caller's fetch.
#[derive(Debug)]
pub struct FlightFollower<V> {
    rx: watch::Receiver<Option<V>>,
}

impl<V: Clone> SingleFlight<V> {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Become leader for `key`, or follow the current leader.
    pub fn claim(&self, key: &str) -> Flight<V> {
        let mut map = lock(&self.inflight);
        if let Some(rx) = map.get(key) {
            return Flight::Follower(FlightFollower { rx: rx.clone() });
        }
        let (tx, rx) = watch::channel(None);
        map.insert(key.to_string(), rx);
        Flight::Leader(FlightLeader {
            key: key.to_string(),
            tx,
            registry: Arc::clone(&self.inflight),
        })
    }

    /// Number of keys currently being fetched.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        lock(&self.inflight).len()
    }
}

impl<V> FlightLeader<V> {
    /// Key this leader owns.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Publish the value to all followers and release the key.
    pub fn complete(self, value: V) {
        self.tx.send_replace(Some(value));
    }
}

impl<V> Drop for FlightLeader<V> {
    fn drop(&mut self) {
        lock(&self.registry).remove(&self.key);
    }
}

impl<V: Clone> FlightFollower<V> {
    /// Wait for the leader.
    ///
    /// Returns `None` when the leader finished without a value, in which case
    /// the caller is expected to fetch on its own.
    pub async fn wait(mut self) -> Option<V> {
        match self.rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        }
    }
}
