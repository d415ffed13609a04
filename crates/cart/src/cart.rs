use serde::{Deserialize, Serialize};

use storefront_core::{Aggregate, DomainError, DomainResult, Entity, Money};
use storefront_events::Event;

use crate::line_item::{ItemSelection, LineItem, LineItemId};

/// Aggregate: the shopper's cart.
///
/// An ordered collection of line items. Invariants held after every `apply`:
/// - no two lines share a [`LineItemId`]
/// - every line has quantity ≥ 1
/// - lines keep the position of their first add
///
/// Totals are never stored; [`Cart::total`] and [`Cart::count`] fold over the
/// lines on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<LineItem>,
    revision: u64,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate a cart from previously persisted lines.
    ///
    /// Rejects duplicate identities; quantities are already validated by
    /// [`LineItem`] construction.
    pub fn from_line_items(items: Vec<LineItem>) -> DomainResult<Self> {
        for (idx, item) in items.iter().enumerate() {
            if items[..idx].iter().any(|earlier| earlier.id() == item.id()) {
                return Err(DomainError::invariant(format!(
                    "duplicate line item {} (index {idx})",
                    item.id()
                )));
            }
        }
        Ok(Self { items, revision: 0 })
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn get(&self, id: &LineItemId) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Σ `unit_price × quantity` over all lines.
    pub fn total(&self) -> Money {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Σ `quantity` over all lines.
    pub fn count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity())).sum()
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            cart_total: self.total(),
            cart_count: self.count(),
        }
    }

    fn line_mut(&mut self, id: &LineItemId) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.id() == id)
    }
}

/// Read-only view of the cart at one instant: lines plus derived aggregates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,
    pub cart_total: Money,
    pub cart_count: u64,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Command: AddItem (merge into an existing line or append a new one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub selection: ItemSelection,
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub id: LineItemId,
}

/// Command: SetQuantity.
///
/// `quantity` is signed so that "decrement below one" requests from the UI
/// reach the aggregate and are rejected there rather than wrapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetQuantity {
    pub id: LineItemId,
    pub quantity: i64,
}

/// Command: ClearCart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCart;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartCommand {
    AddItem(AddItem),
    RemoveItem(RemoveItem),
    SetQuantity(SetQuantity),
    ClearCart(ClearCart),
}

/// Event: ItemAdded (new line appended with quantity 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub item: LineItem,
}

/// Event: QuantityIncremented (repeat add of an existing identity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityIncremented {
    pub id: LineItemId,
    pub quantity: u32,
}

/// Event: QuantityChanged (explicit quantity edit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChanged {
    pub id: LineItemId,
    pub previous: u32,
    pub quantity: u32,
}

/// Event: ItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRemoved {
    pub id: LineItemId,
}

/// Event: CartCleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCleared {
    pub removed_lines: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CartEvent {
    ItemAdded(ItemAdded),
    QuantityIncremented(QuantityIncremented),
    QuantityChanged(QuantityChanged),
    ItemRemoved(ItemRemoved),
    CartCleared(CartCleared),
}

impl Event for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::ItemAdded(_) => "cart.item_added",
            CartEvent::QuantityIncremented(_) => "cart.quantity_incremented",
            CartEvent::QuantityChanged(_) => "cart.quantity_changed",
            CartEvent::ItemRemoved(_) => "cart.item_removed",
            CartEvent::CartCleared(_) => "cart.cleared",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}

impl Aggregate for Cart {
    type Command = CartCommand;
    type Event = CartEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CartEvent::ItemAdded(e) => {
                self.items.push(e.item.clone());
            }
            CartEvent::QuantityIncremented(QuantityIncremented { id, quantity })
            | CartEvent::QuantityChanged(QuantityChanged { id, quantity, .. }) => {
                if let Some(line) = self.line_mut(id) {
                    line.set_quantity(*quantity);
                }
            }
            CartEvent::ItemRemoved(e) => {
                self.items.retain(|item| item.id() != &e.id);
            }
            CartEvent::CartCleared(_) => {
                self.items.clear();
            }
        }

        self.revision += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CartCommand::AddItem(cmd) => self.handle_add_item(cmd),
            CartCommand::RemoveItem(cmd) => self.handle_remove_item(cmd),
            CartCommand::SetQuantity(cmd) => self.handle_set_quantity(cmd),
            CartCommand::ClearCart(_) => self.handle_clear(),
        }
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

impl Cart {
    fn handle_add_item(&self, cmd: &AddItem) -> Result<Vec<CartEvent>, DomainError> {
        let id = cmd.selection.line_item_id();

        // First add wins: price and display fields are never re-captured.
        if let Some(existing) = self.get(&id) {
            if existing.quantity() == u32::MAX {
                return Ok(vec![]);
            }
            return Ok(vec![CartEvent::QuantityIncremented(QuantityIncremented {
                id,
                quantity: existing.quantity() + 1,
            })]);
        }

        Ok(vec![CartEvent::ItemAdded(ItemAdded {
            item: LineItem::from_selection(cmd.selection.clone()),
        })])
    }

    fn handle_remove_item(&self, cmd: &RemoveItem) -> Result<Vec<CartEvent>, DomainError> {
        if self.get(&cmd.id).is_none() {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::ItemRemoved(ItemRemoved { id: cmd.id.clone() })])
    }

    fn handle_set_quantity(&self, cmd: &SetQuantity) -> Result<Vec<CartEvent>, DomainError> {
        // Removal is a distinct action; non-positive edits are rejected, never clamped.
        if cmd.quantity < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        let quantity = u32::try_from(cmd.quantity)
            .map_err(|_| DomainError::validation("quantity is too large"))?;

        let Some(existing) = self.get(&cmd.id) else {
            return Ok(vec![]);
        };

        if existing.quantity() == quantity {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::QuantityChanged(QuantityChanged {
            id: cmd.id.clone(),
            previous: existing.quantity(),
            quantity,
        })])
    }

    fn handle_clear(&self) -> Result<Vec<CartEvent>, DomainError> {
        if self.items.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![CartEvent::CartCleared(CartCleared {
            removed_lines: self.items.len(),
        })])
    }
}
