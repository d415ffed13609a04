use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use storefront_cart::{CartSnapshot, LineItem};
use storefront_core::{CheckoutAttemptId, DomainError, DomainResult, Money, ProductId};

use crate::contact::CustomerContact;

/// Proof of payment from the external payment provider.
///
/// The storefront never talks to the provider itself; it only forwards the
/// reference the provider returned after capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    /// Provider slug (e.g. "paypal").
    pub provider: String,
    /// Provider-side capture/order reference.
    pub reference: String,
}

impl PaymentConfirmation {
    pub fn new(provider: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            reference: reference.into(),
        }
    }

    pub fn paypal(reference: impl Into<String>) -> Self {
        Self::new("paypal", reference)
    }
}

/// Order line: product, quantity and the variant chosen (as line metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Price captured when the item entered the cart.
    pub unit_price: Money,
    pub color: String,
    pub size: String,
}

impl OrderLine {
    /// Key/value metadata attached to the backend line item.
    pub fn metadata(&self) -> [(&'static str, &str); 2] {
        [("Color", self.color.as_str()), ("Size", self.size.as_str())]
    }
}

impl From<&LineItem> for OrderLine {
    fn from(item: &LineItem) -> Self {
        Self {
            product_id: item.product_id(),
            name: item.name().to_string(),
            quantity: item.quantity(),
            unit_price: item.unit_price(),
            color: item.color().to_string(),
            size: item.size().to_string(),
        }
    }
}

/// A paid order ready to be relayed to the commerce backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub attempt_id: CheckoutAttemptId,
    pub customer: CustomerContact,
    /// Lines in cart order.
    pub lines: Vec<OrderLine>,
    pub total: Money,
    /// ISO 4217 code the total was charged in.
    pub currency: String,
    pub payment: PaymentConfirmation,
}

impl OrderRequest {
    /// Build a request from the cart as it is at checkout time.
    pub fn from_snapshot(
        customer: CustomerContact,
        snapshot: &CartSnapshot,
        payment: PaymentConfirmation,
        currency: impl Into<String>,
    ) -> DomainResult<Self> {
        customer.validate()?;

        if snapshot.is_empty() {
            return Err(DomainError::validation("cannot place an order for an empty cart"));
        }

        if payment.reference.trim().is_empty() {
            return Err(DomainError::validation("payment confirmation reference is missing"));
        }

        Ok(Self {
            attempt_id: CheckoutAttemptId::new(),
            customer,
            lines: snapshot.items.iter().map(OrderLine::from).collect(),
            total: snapshot.cart_total,
            currency: currency.into(),
            payment,
        })
    }

    /// Σ quantity over all lines.
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// Backend acknowledgement of a created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// Opaque backend order identifier.
    pub order_id: String,
    /// Backend order status, when reported.
    pub status: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_cart::{AddItem, Cart, CartCommand, ItemSelection, SetQuantity};
    use storefront_core::Aggregate;

    fn contact() -> CustomerContact {
        CustomerContact::new("Noa", "Levi", "noa@example.co.il", "0501234567")
    }

    fn selection(product_id: u64, color: &str, size: &str, price_minor: u64) -> ItemSelection {
        ItemSelection {
            product_id: ProductId::new(product_id),
            name: format!("Product {product_id}"),
            unit_price: Money::from_minor(price_minor),
            image: String::new(),
            color: color.to_string(),
            size: size.to_string(),
            slug: String::new(),
            brand: None,
        }
    }

    fn cart_with(lines: &[(ItemSelection, i64)]) -> Cart {
        let mut cart = Cart::new();
        for (sel, qty) in lines {
            cart.execute(&CartCommand::AddItem(AddItem { selection: sel.clone() }))
                .unwrap();
            cart.execute(&CartCommand::SetQuantity(SetQuantity {
                id: sel.line_item_id(),
                quantity: *qty,
            }))
            .unwrap();
        }
        cart
    }

    #[test]
    fn request_copies_lines_in_cart_order_with_variant_metadata() {
        let cart = cart_with(&[
            (selection(10, "Ivory", "m", 1000), 2),
            (selection(11, "Default", "One Size", 550), 3),
        ]);

        let request = OrderRequest::from_snapshot(
            contact(),
            &cart.snapshot(),
            PaymentConfirmation::paypal("5O190127TN364715T"),
            "ILS",
        )
        .unwrap();

        assert_eq!(request.lines.len(), 2);
        assert_eq!(request.lines[0].product_id, ProductId::new(10));
        assert_eq!(request.lines[0].quantity, 2);
        assert_eq!(request.lines[0].metadata(), [("Color", "Ivory"), ("Size", "m")]);
        assert_eq!(request.lines[1].product_id, ProductId::new(11));
        assert_eq!(request.total, Money::from_minor(3650));
        assert_eq!(request.item_count(), 5);
        assert_eq!(request.currency, "ILS");
        assert_eq!(request.payment.provider, "paypal");
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = OrderRequest::from_snapshot(
            contact(),
            &Cart::new().snapshot(),
            PaymentConfirmation::paypal("ref"),
            "ILS",
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("empty cart")));
    }

    #[test]
    fn invalid_contact_is_rejected_before_anything_else() {
        let mut bad = contact();
        bad.email = "nope".to_string();
        let err = OrderRequest::from_snapshot(
            bad,
            &Cart::new().snapshot(),
            PaymentConfirmation::paypal("ref"),
            "ILS",
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("email")));
    }

    #[test]
    fn blank_payment_reference_is_rejected() {
        let cart = cart_with(&[(selection(1, "red", "m", 100), 1)]);
        let err = OrderRequest::from_snapshot(
            contact(),
            &cart.snapshot(),
            PaymentConfirmation::paypal("  "),
            "ILS",
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(m) if m.contains("payment")));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the request total and item count always equal the snapshot's.
            #[test]
            fn request_totals_match_snapshot(
                lines in prop::collection::vec((1u64..20, 1i64..10, 1u64..50_000), 1..10)
            ) {
                let selections: Vec<(ItemSelection, i64)> = lines
                    .into_iter()
                    .enumerate()
                    .map(|(i, (pid, qty, price))| (selection(pid, "c", &format!("s{i}"), price), qty))
                    .collect();
                let snapshot = cart_with(&selections).snapshot();

                let request = OrderRequest::from_snapshot(
                    contact(),
                    &snapshot,
                    PaymentConfirmation::paypal("ref"),
                    "ILS",
                )
                .unwrap();

                prop_assert_eq!(request.total, snapshot.cart_total);
                prop_assert_eq!(request.item_count(), snapshot.cart_count);
                prop_assert_eq!(request.lines.len(), snapshot.items.len());
            }
        }
    }
}
