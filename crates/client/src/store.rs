//! Cart Store: the single authoritative holder of the shopper's cart.
//!
//! The store composes the pure [`Cart`] aggregate with a durable
//! [`StorageSlot`] and a [`ChangeNotifier`]. Every mutation runs the same
//! pipeline under the state lock:
//!
//! ```text
//! Command
//!   ↓
//! 1. Handle (pure decision, produces events or a validation error)
//!   ↓
//! 2. Apply events to the in-memory cart
//!   ↓
//! 3. Persist the full line-item list (write-through, best-effort)
//!   ↓
//! 4. Queue a change notification (only if something changed)
//!   ↓
//! 5. Release the lock, then deliver queued notifications in FIFO order
//! ```
//!
//! A subscriber that mutates the store from inside its callback does not
//! preempt the current round: the nested change is delivered to every
//! subscriber after all of them have seen the change that triggered it.
//!
//! ## Failure semantics
//!
//! Nothing propagates to callers:
//!
//! - corrupt or unreadable persisted state at open: start empty, `warn!`
//! - a failed write: the in-memory cart stays authoritative, `error!`; the
//!   next accepted mutation writes the then-current cart
//! - a rejected command (quantity below 1): silent no-op, `debug!`, nothing
//!   persisted and nobody notified

use std::sync::{Mutex, MutexGuard, PoisonError};

use storefront_cart::{
    AddItem, Cart, CartCommand, CartEvent, CartSnapshot, ClearCart, ItemSelection, LineItem,
    LineItemId, RemoveItem, SetQuantity,
};
use storefront_core::Aggregate;
use storefront_events::{ChangeNotifier, Event, Subscription};
use storefront_infra::StorageSlot;

/// Notification delivered to subscribers after a mutation that changed the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChanged {
    /// Cart revision after the events were applied.
    pub revision: u64,
    /// Events applied by the mutation, in order.
    pub events: Vec<CartEvent>,
    /// Cart contents after the mutation.
    pub snapshot: CartSnapshot,
}

/// Client-side cart state manager.
///
/// Share one instance per session (`Arc<CartStore<_>>`). Operations are
/// synchronous and serialized by an internal mutex; subscribers run after the
/// mutex is released, so a callback may read or mutate the store.
pub struct CartStore<S: StorageSlot> {
    cart: Mutex<Cart>,
    storage: S,
    notifier: ChangeNotifier<CartChanged>,
}

impl<S: StorageSlot> core::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.lock())
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl<S: StorageSlot> CartStore<S> {
    /// Open the store, restoring the cart persisted in `storage` (or starting empty).
    pub fn open(storage: S) -> Self {
        let cart = restore(&storage);

        tracing::info!(
            lines = cart.len(),
            items = cart.count(),
            "cart store opened"
        );

        Self {
            cart: Mutex::new(cart),
            storage,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Add one unit of `selection`.
    ///
    /// An existing line with the same (product, color, size) gains one unit and
    /// keeps its position, price and display fields; otherwise a new line is
    /// appended with quantity 1.
    pub fn add_item(&self, selection: ItemSelection) {
        self.dispatch(CartCommand::AddItem(AddItem { selection }));
    }

    /// Remove the line with `id`; no-op if it is not in the cart.
    pub fn remove_item(&self, id: &LineItemId) {
        self.dispatch(CartCommand::RemoveItem(RemoveItem { id: id.clone() }));
    }

    /// Replace the quantity of the line with `id`.
    ///
    /// Values below 1 are ignored (the line is neither removed nor clamped).
    pub fn set_quantity(&self, id: &LineItemId, quantity: i64) {
        self.dispatch(CartCommand::SetQuantity(SetQuantity {
            id: id.clone(),
            quantity,
        }));
    }

    /// Empty the cart and persist the empty cart.
    pub fn clear(&self) {
        self.dispatch(CartCommand::ClearCart(ClearCart));
    }

    /// Ordered lines plus freshly computed total and count.
    pub fn snapshot(&self) -> CartSnapshot {
        self.lock().snapshot()
    }

    /// Register `callback` for every change from now on.
    ///
    /// Dropping the returned [`Subscription`] (or calling
    /// [`Subscription::unsubscribe`]) stops delivery.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CartChanged) + Send + Sync + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn lock(&self) -> MutexGuard<'_, Cart> {
        // The cart is only mutated through `Aggregate::apply`, which cannot
        // leave it half-updated, so a poisoned lock still guards a valid cart.
        self.cart.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, command: CartCommand) {
        let changed = {
            let mut cart = self.lock();

            let events = match cart.handle(&command) {
                Ok(events) => events,
                Err(err) => {
                    tracing::debug!(?command, error = %err, "cart command ignored");
                    return;
                }
            };

            for event in &events {
                cart.apply(event);
            }

            self.persist(&cart);

            if events.is_empty() {
                tracing::debug!(?command, "cart command changed nothing");
                false
            } else {
                for event in &events {
                    tracing::info!(
                        event_type = event.event_type(),
                        revision = cart.revision(),
                        "cart updated"
                    );
                }
                // Queued under the cart lock so delivery order matches revision order.
                self.notifier.enqueue(CartChanged {
                    revision: cart.revision(),
                    events,
                    snapshot: cart.snapshot(),
                });
                true
            }
        };

        if changed {
            self.notifier.flush();
        }
    }

    fn persist(&self, cart: &Cart) {
        let document = match serde_json::to_string(cart.line_items()) {
            Ok(document) => document,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize cart; keeping in-memory state");
                return;
            }
        };

        if let Err(err) = self.storage.save(&document) {
            tracing::error!(error = %err, "failed to persist cart; keeping in-memory state");
        }
    }
}

/// Rebuild the cart from storage, falling back to empty on any problem.
fn restore<S: StorageSlot>(storage: &S) -> Cart {
    let document = match storage.load() {
        Ok(Some(document)) => document,
        Ok(None) => return Cart::new(),
        Err(err) => {
            tracing::warn!(error = %err, "could not read persisted cart; starting empty");
            return Cart::new();
        }
    };

    let items: Vec<LineItem> = match serde_json::from_str(&document) {
        Ok(items) => items,
        Err(err) => {
            tracing::warn!(error = %err, "persisted cart is not valid; starting empty");
            return Cart::new();
        }
    };

    match Cart::from_line_items(items) {
        Ok(cart) => cart,
        Err(err) => {
            tracing::warn!(error = %err, "persisted cart violates cart invariants; starting empty");
            Cart::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storefront_core::{Money, ProductId};
    use storefront_infra::InMemorySlot;

    fn test_selection(product_id: u64, color: &str, size: &str) -> ItemSelection {
        ItemSelection {
            product_id: ProductId::new(product_id),
            name: format!("Product {product_id}"),
            unit_price: Money::from_minor(1000),
            image: String::new(),
            color: color.to_string(),
            size: size.to_string(),
            slug: String::new(),
            brand: None,
        }
    }

    #[test]
    fn rejected_quantity_does_not_persist() {
        let slot = Arc::new(InMemorySlot::new());
        let store = CartStore::open(Arc::clone(&slot));
        let sel = test_selection(1, "red", "m");

        store.add_item(sel.clone());
        let saves = slot.save_count();

        store.set_quantity(&sel.line_item_id(), 0);
        store.set_quantity(&sel.line_item_id(), -4);

        assert_eq!(slot.save_count(), saves);
        assert_eq!(store.snapshot().items[0].quantity(), 1);
    }

    #[test]
    fn accepted_no_op_still_persists_but_does_not_notify() {
        let slot = Arc::new(InMemorySlot::new());
        let store = CartStore::open(Arc::clone(&slot));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _sub = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.clear();
        store.remove_item(&test_selection(9, "x", "y").line_item_id());

        assert_eq!(slot.save_count(), 2);
        assert_eq!(slot.value().as_deref(), Some("[]"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn notification_carries_events_and_post_mutation_snapshot() {
        let store = CartStore::open(InMemorySlot::new());
        let seen = Arc::new(Mutex::new(Vec::<CartChanged>::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |changed| {
            sink.lock().unwrap().push(changed.clone());
        });

        let sel = test_selection(1, "red", "m");
        store.add_item(sel.clone());
        store.add_item(sel);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0].events.as_slice(), [CartEvent::ItemAdded(_)]));
        assert!(matches!(seen[1].events.as_slice(), [CartEvent::QuantityIncremented(_)]));
        assert_eq!(seen[1].revision, 2);
        assert_eq!(seen[1].snapshot.cart_count, 2);
    }

    #[test]
    fn unreadable_storage_starts_empty() {
        let slot = InMemorySlot::with_value("[]");
        slot.set_fail_reads(true);

        let store = CartStore::open(slot);
        assert!(store.snapshot().is_empty());
    }
}
