//! Per-widget change notifier

/// Identifies one subscription on a notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered list of subscribers.
///
/// Notifying is done by the owner from a [`snapshot`](Self::snapshot), so a
/// subscriber added while a notification is running only sees later ones,
/// and one removed mid-notification can be skipped with
/// [`contains`](Self::contains).
#[derive(Debug, Clone)]
pub struct ChangeNotifier<S> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, S)>,
}

impl<S: Clone> ChangeNotifier<S> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: S) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Returns false if the subscription was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.subscribers.iter().any(|(sub, _)| *sub == id)
    }

    /// Current subscribers in subscription order
    pub fn snapshot(&self) -> Vec<(SubscriptionId, S)> {
        self.subscribers.clone()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<S: Clone> Default for ChangeNotifier<S> {
    fn default() -> Self {
        Self::new()
    }
}
