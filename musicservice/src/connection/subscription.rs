use crate::models::MediaItem;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for a catalog subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

type ChildrenHandler = Box<dyn Fn(&str, &[MediaItem]) + Send + Sync>;
type ErrorHandler = Box<dyn Fn(&str) + Send + Sync>;

/// Receives catalog notifications for a subscribed node
#[derive(Default)]
pub struct SubscriptionCallback {
    on_children_loaded: Option<ChildrenHandler>,
    on_error: Option<ErrorHandler>,
}

impl SubscriptionCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_children_loaded<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str, &[MediaItem]) + Send + Sync + 'static,
    {
        self.on_children_loaded = Some(Box::new(handler));
        self
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(handler));
        self
    }

    fn children_loaded(&self, parent_id: &str, children: &[MediaItem]) {
        if let Some(ref handler) = self.on_children_loaded {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(parent_id, children);
            }));
            if result.is_err() {
                log::error!("Subscription handler for '{}' panicked", parent_id);
            }
        }
    }

    fn error(&self, parent_id: &str) {
        if let Some(ref handler) = self.on_error {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(parent_id);
            }));
            if result.is_err() {
                log::error!("Subscription error handler for '{}' panicked", parent_id);
            }
        }
    }
}

impl std::fmt::Debug for SubscriptionCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionCallback")
            .field("on_children_loaded", &self.on_children_loaded.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

struct Subscription {
    id: SubscriptionId,
    parent_id: String,
    callback: Arc<SubscriptionCallback>,
}

/// Catalog subscriptions held by the connection manager
///
/// Several callbacks may watch the same node; the remote side is only asked
/// to subscribe once per node.
#[derive(Default)]
pub(crate) struct SubscriptionRegistry {
    entries: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the new id and whether this is the first subscription on `parent_id`
    pub(crate) fn add(
        &mut self,
        parent_id: &str,
        callback: Arc<SubscriptionCallback>,
    ) -> (SubscriptionId, bool) {
        let first = !self.is_subscribed(parent_id);
        let id = SubscriptionId::new();
        self.entries.push(Subscription {
            id,
            parent_id: parent_id.to_string(),
            callback,
        });
        log::debug!("Registered subscription {} on '{}'", id, parent_id);
        (id, first)
    }

    /// Removes every subscription on `parent_id`, returning how many were removed
    pub(crate) fn remove(&mut self, parent_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|s| {
            let keep = s.parent_id != parent_id;
            if !keep {
                log::debug!("Removed subscription {} on '{}'", s.id, parent_id);
            }
            keep
        });
        before - self.entries.len()
    }

    pub(crate) fn is_subscribed(&self, parent_id: &str) -> bool {
        self.entries.iter().any(|s| s.parent_id == parent_id)
    }

    /// Distinct subscribed node ids, in first-subscribed order
    pub(crate) fn parent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&entry.parent_id) {
                ids.push(entry.parent_id.clone());
            }
        }
        ids
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn dispatch_children(&self, parent_id: &str, children: &[MediaItem]) -> usize {
        let mut delivered = 0;
        for entry in self.entries.iter().filter(|s| s.parent_id == parent_id) {
            entry.callback.children_loaded(parent_id, children);
            delivered += 1;
        }
        delivered
    }

    pub(crate) fn dispatch_error(&self, parent_id: &str) -> usize {
        let mut delivered = 0;
        for entry in self.entries.iter().filter(|s| s.parent_id == parent_id) {
            entry.callback.error(parent_id);
            delivered += 1;
        }
        delivered
    }
}
