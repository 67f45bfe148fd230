//! Ordered set that notifies listeners on mutation.

use std::collections::BTreeSet;
use std::ops::Bound;

/// Change notification delivered to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionEvent<'a, T> {
    Added(&'a T),
    Removed(&'a T),
}

/// Handle returned by [`ObservableSet::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Box<dyn FnMut(&CollectionEvent<'_, T>) + Send>;

/// A sorted set whose `add`/`remove` report success and notify listeners
/// synchronously, in subscription order.
pub struct ObservableSet<T: Ord> {
    items: BTreeSet<T>,
    listeners: Vec<(ListenerId, Listener<T>)>,
    next_listener: u64,
}

impl<T: Ord> Default for ObservableSet<T> {
    fn default() -> Self {
        Self {
            items: BTreeSet::new(),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }
}

impl<T: Ord> ObservableSet<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item. Returns `false` (and notifies nobody) if an equal
    /// item is already present.
    pub fn add(&mut self, item: T) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.notify(&CollectionEvent::Added(&item));
        self.items.insert(item)
    }

    /// Remove an item. Returns `false` if it was not present.
    pub fn remove(&mut self, item: &T) -> bool {
        self.take(item).is_some()
    }

    /// Remove and return an item, notifying listeners.
    pub fn take(&mut self, item: &T) -> Option<T> {
        let removed = self.items.take(item)?;
        self.notify(&CollectionEvent::Removed(&removed));
        Some(removed)
    }

    /// Remove without notification; used for in-place updates.
    pub(crate) fn take_silently(&mut self, item: &T) -> Option<T> {
        self.items.take(item)
    }

    /// Insert without notification; used for in-place updates.
    pub(crate) fn insert_silently(&mut self, item: T) -> bool {
        self.items.insert(item)
    }

    #[must_use]
    pub fn get(&self, item: &T) -> Option<&T> {
        self.items.get(item)
    }

    #[must_use]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains(item)
    }

    /// Greatest item strictly less than `item`
    #[must_use]
    pub fn before(&self, item: &T) -> Option<&T> {
        self.items
            .range((Bound::Unbounded, Bound::Excluded(item)))
            .next_back()
    }

    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, T> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Register a listener; it is called for every later add/remove.
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&CollectionEvent<'_, T>) + Send + 'static,
    {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Unregister a listener. Returns `false` if the id is unknown.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: &CollectionEvent<'_, T>) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder(set: &mut ObservableSet<i32>) -> Arc<Mutex<Vec<String>>> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        set.subscribe(move |event| {
            let entry = match event {
                CollectionEvent::Added(v) => format!("+{v}"),
                CollectionEvent::Removed(v) => format!("-{v}"),
            };
            sink.lock().unwrap().push(entry);
        });
        log
    }

    #[test]
    fn test_add_remove_notify() {
        let mut set = ObservableSet::new();
        let log = recorder(&mut set);

        assert!(set.add(2));
        assert!(set.add(1));
        assert!(!set.add(2));
        assert!(set.remove(&2));
        assert!(!set.remove(&5));

        assert_eq!(*log.lock().unwrap(), vec!["+2", "+1", "-2"]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut set = ObservableSet::new();
        let log = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&log);
        let id = set.subscribe(move |_| *sink.lock().unwrap() += 1);

        set.add(1);
        assert!(set.unsubscribe(id));
        assert!(!set.unsubscribe(id));
        set.add(2);

        assert_eq!(*log.lock().unwrap(), 1);
    }

    #[test]
    fn test_before() {
        let mut set = ObservableSet::new();
        for v in [10, 30, 20] {
            set.add(v);
        }
        assert_eq!(set.before(&30), Some(&20));
        assert_eq!(set.before(&25), Some(&20));
        assert_eq!(set.before(&10), None);
    }
}
