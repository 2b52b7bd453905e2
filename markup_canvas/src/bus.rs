// Copyright 2025 the Markup Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Synchronous publish/subscribe.

use core::fmt;

/// Handle returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// A single-threaded event bus.
///
/// Listeners run synchronously inside [`publish`](Self::publish), in subscription order.
/// A listener cannot reach the bus it is registered on (it is borrowed for the duration of
/// the publish), so it cannot re-enter or unsubscribe itself; record what you need and act
/// after `publish` returns.
pub struct EventBus<E> {
    next: u64,
    listeners: Vec<(Subscription, Box<dyn FnMut(&E)>)>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<E> EventBus<E> {
    /// A bus with no listeners.
    pub fn new() -> Self {
        Self {
            next: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> Subscription {
        let sub = Subscription(self.next);
        self.next += 1;
        self.listeners.push((sub, Box::new(listener)));
        sub
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(s, _)| *s != sub);
        self.listeners.len() != before
    }

    /// Whether `sub` is still registered.
    pub fn is_subscribed(&self, sub: Subscription) -> bool {
        self.listeners.iter().any(|(s, _)| *s == sub)
    }

    /// Deliver `event` to every listener. Returns how many were called.
    pub fn publish(&mut self, event: &E) -> usize {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
        self.listeners.len()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Drop every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn delivers_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut bus = EventBus::new();
        let l1 = log.clone();
        bus.subscribe(move |e: &u32| l1.borrow_mut().push(("a", *e)));
        let l2 = log.clone();
        bus.subscribe(move |e: &u32| l2.borrow_mut().push(("b", *e)));
        assert_eq!(bus.publish(&7), 2);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hits = Rc::new(RefCell::new(0));
        let mut bus = EventBus::<()>::new();
        let h = hits.clone();
        let sub = bus.subscribe(move |_| *h.borrow_mut() += 1);
        bus.publish(&());
        assert!(bus.unsubscribe(sub));
        assert!(!bus.unsubscribe(sub), "second unsubscribe is a no-op");
        bus.publish(&());
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(bus.listener_count(), 0);
    }
}
