use std::collections::HashMap;

use crate::fetcher::{ViewFetcher, ViewKind};
use crate::protocol::HostMessage;

/// Owned registry of open views.
///
/// Anything that needs a view's callbacks or state (menu construction,
/// header rendering) gets this object by reference; there is no
/// process-wide singleton. A view lives in the registry from first render
/// until it is closed.
#[derive(Default)]
pub struct ViewRegistry {
    namespace: String,
    views: HashMap<String, ViewFetcher>,
}

impl ViewRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            views: HashMap::new(),
        }
    }

    /// Fetch-or-create the fetcher for a view key.
    pub fn register(&mut self, kind: ViewKind, view_key: &str) -> &mut ViewFetcher {
        self.views
            .entry(view_key.to_string())
            .or_insert_with(|| ViewFetcher::new(kind, self.namespace.clone(), view_key))
    }

    pub fn get(&self, view_key: &str) -> Option<&ViewFetcher> {
        self.views.get(view_key)
    }

    pub fn get_mut(&mut self, view_key: &str) -> Option<&mut ViewFetcher> {
        self.views.get_mut(view_key)
    }

    /// Tear down a closed view. Its pending edits die with it.
    pub fn remove(&mut self, view_key: &str) -> Option<ViewFetcher> {
        self.views.remove(view_key)
    }

    pub fn view_keys(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    /// Route an inbound message to its view. Messages for unknown views
    /// are ignored — the host may still be streaming snapshots for a view
    /// that was just closed. Returns whether a view accepted the message.
    pub fn dispatch(&mut self, message: &HostMessage) -> bool {
        let HostMessage::Fields(snapshot) = message;
        match self.views.get_mut(&snapshot.view_key) {
            Some(fetcher) => fetcher.on_message(snapshot),
            None => {
                tracing::debug!("No open view for snapshot {}", snapshot.view_key);
                false
            }
        }
    }
}
