//! Synchronous change notification (observer pattern, mechanics only).
//!
//! A [`ChangeNotifier`] keeps a list of callbacks and delivers each message to
//! all of them, in subscription order.
//!
//! ## Delivery
//!
//! - **Synchronous**: a message is delivered before `notify` returns, unless a
//!   delivery is already in progress (see below)
//! - **Push-based**: observers never poll
//! - **FIFO**: messages are queued and drained one at a time. A message sent
//!   while another is being delivered (for example by a callback that mutates
//!   the source) is appended to the queue and delivered by the outer drain once
//!   every subscriber has seen the current message. Each subscriber therefore
//!   sees messages in the order they were enqueued.
//! - **Re-entrant**: the callback list is copied before delivery, so a callback may
//!   subscribe, unsubscribe, or trigger another notification without deadlocking
//!
//! ## Lifetime
//!
//! `subscribe` returns a [`Subscription`] guard. Dropping the guard (or calling
//! [`Subscription::unsubscribe`]) removes the callback; [`Subscription::detach`]
//! keeps it registered for as long as the notifier lives.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Callback<M> = Arc<dyn Fn(&M) + Send + Sync>;

struct Registry<M> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<M>)>,
    pending: VecDeque<M>,
    draining: bool,
}

impl<M> Default for Registry<M> {
    fn default() -> Self {
        Self {
            next_id: 0,
            callbacks: Vec::new(),
            pending: VecDeque::new(),
            draining: false,
        }
    }
}

/// In-process fan-out of change messages to registered callbacks.
pub struct ChangeNotifier<M> {
    registry: Arc<Mutex<Registry<M>>>,
}

impl<M> Default for ChangeNotifier<M> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }
}

impl<M> core::fmt::Debug for ChangeNotifier<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let registry = lock(&self.registry);
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &registry.callbacks.len())
            .field("pending", &registry.pending.len())
            .finish()
    }
}

fn lock<M>(registry: &Mutex<Registry<M>>) -> MutexGuard<'_, Registry<M>> {
    // A panicking callback never runs under the lock, so the registry is
    // always consistent even if the mutex was poisoned.
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the draining flag if a callback panics mid-drain.
struct DrainGuard<'a, M> {
    registry: &'a Mutex<Registry<M>>,
}

impl<M> Drop for DrainGuard<'_, M> {
    fn drop(&mut self) {
        lock(self.registry).draining = false;
    }
}

impl<M: Send + 'static> ChangeNotifier<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it receives every message delivered from now on.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&M) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.callbacks.push((id, Arc::new(callback)));
            id
        };

        let weak: Weak<Mutex<Registry<M>>> = Arc::downgrade(&self.registry);
        Subscription {
            id,
            remove: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    lock(&registry).callbacks.retain(|(cb_id, _)| *cb_id != id);
                }
            })),
        }
    }

    /// Queue `message` and deliver everything pending.
    pub fn notify(&self, message: M) {
        self.enqueue(message);
        self.flush();
    }

    /// Queue `message` without delivering it.
    ///
    /// Lets a caller fix the delivery order while holding its own lock, then
    /// [`flush`](Self::flush) after releasing it.
    pub fn enqueue(&self, message: M) {
        lock(&self.registry).pending.push_back(message);
    }

    /// Deliver pending messages in FIFO order.
    ///
    /// Returns immediately if a drain is already running (on this thread, from
    /// inside a callback, or on another thread); that drain delivers the
    /// messages queued here.
    pub fn flush(&self) {
        {
            let mut registry = lock(&self.registry);
            if registry.draining {
                return;
            }
            registry.draining = true;
        }
        let guard = DrainGuard {
            registry: &*self.registry,
        };

        loop {
            let (message, callbacks) = {
                let mut registry = lock(&self.registry);
                let Some(message) = registry.pending.pop_front() else {
                    // Cleared under the same lock as the empty check, so a
                    // concurrent `flush` either sees the flag or finds work.
                    registry.draining = false;
                    break;
                };
                let callbacks: Vec<Callback<M>> = registry
                    .callbacks
                    .iter()
                    .map(|(_, cb)| Arc::clone(cb))
                    .collect();
                (message, callbacks)
            };

            tracing::trace!(subscribers = callbacks.len(), "delivering change notification");

            for callback in callbacks {
                callback(&message);
            }
        }

        core::mem::forget(guard);
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.registry).callbacks.len()
    }
}

/// Handle to a registered callback.
///
/// The callback stays registered while this handle is alive.
#[must_use = "dropping a Subscription unsubscribes its callback immediately"]
pub struct Subscription {
    id: u64,
    remove: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Subscriber id, unique per notifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the callback from its notifier.
    pub fn unsubscribe(mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }

    /// Keep the callback registered for the notifier's whole lifetime.
    pub fn detach(mut self) {
        self.remove = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(remove) = self.remove.take() {
            remove();
        }
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.remove.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl Fn(&u32) + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        (count, move |_: &u32| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn notify_reaches_every_subscriber() {
        let notifier = ChangeNotifier::<u32>::new();
        let (a, cb_a) = counter();
        let (b, cb_b) = counter();
        let _sa = notifier.subscribe(cb_a);
        let _sb = notifier.subscribe(cb_b);

        notifier.notify(1);
        notifier.notify(2);

        assert_eq!(a.load(Ordering::SeqCst), 2);
        assert_eq!(b.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::<u32>::new();
        let (count, cb) = counter();
        let sub = notifier.subscribe(cb);

        notifier.notify(1);
        sub.unsubscribe();
        notifier.notify(2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn dropping_the_guard_unsubscribes_but_detach_keeps_it() {
        let notifier = ChangeNotifier::<u32>::new();
        let (dropped, cb_dropped) = counter();
        let (detached, cb_detached) = counter();

        drop(notifier.subscribe(cb_dropped));
        notifier.subscribe(cb_detached).detach();
        notifier.notify(1);

        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        assert_eq!(detached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delivery_follows_subscription_order() {
        let notifier = ChangeNotifier::<u32>::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Vec::new();
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            subs.push(notifier.subscribe(move |_| order.lock().unwrap().push(tag)));
        }

        notifier.notify(0);

        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn callbacks_may_reenter_the_notifier() {
        let notifier = Arc::new(ChangeNotifier::<u32>::new());
        let inner = Arc::clone(&notifier);
        let _sub = notifier.subscribe(move |_| {
            // Would deadlock if the registry lock were held during delivery.
            assert_eq!(inner.subscriber_count(), 1);
        });

        notifier.notify(0);
    }

    #[test]
    fn nested_notifications_are_delivered_after_the_current_round() {
        let notifier = Arc::new(ChangeNotifier::<u32>::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner = Arc::clone(&notifier);
        let first = Arc::clone(&seen);
        let _a = notifier.subscribe(move |msg| {
            first.lock().unwrap().push(("a", *msg));
            if *msg == 1 {
                inner.notify(2);
            }
        });
        let second = Arc::clone(&seen);
        let _b = notifier.subscribe(move |msg| second.lock().unwrap().push(("b", *msg)));

        notifier.notify(1);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]
        );
    }

    #[test]
    fn panicking_callback_does_not_stall_later_deliveries() {
        let notifier = ChangeNotifier::<u32>::new();
        let (count, cb) = counter();
        let _sa = notifier.subscribe(|msg| assert_ne!(*msg, 0));
        let _sb = notifier.subscribe(cb);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| notifier.notify(0)));
        assert!(result.is_err());

        notifier.notify(1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_reports_subscribers() {
        let notifier = ChangeNotifier::<String>::new();
        let _sub = notifier.subscribe(|_| {});
        assert_eq!(
            format!("{notifier:?}"),
            "ChangeNotifier { subscribers: 1, pending: 0 }"
        );
    }

    #[test]
    fn subscription_outliving_notifier_is_harmless() {
        let notifier = ChangeNotifier::<u32>::new();
        let (_count, cb) = counter();
        let sub = notifier.subscribe(cb);
        drop(notifier);
        sub.unsubscribe();
    }
}
