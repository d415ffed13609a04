//! Checkout: turn the current cart into a backend order after payment.

use thiserror::Error;

use storefront_core::DomainError;
use storefront_infra::StorageSlot;
use storefront_orders::{
    CustomerContact, OrderConfirmation, OrderRelay, OrderRequest, PaymentConfirmation, RelayError,
};

use crate::store::CartStore;

pub const ORDER_FAILED_MESSAGE: &str =
    "Payment received, but failed to create order. Please contact support.";

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The request could not be built (invalid contact, empty cart, missing reference).
    #[error(transparent)]
    Invalid(#[from] DomainError),

    /// Payment went through but the backend did not create the order.
    #[error("order relay failed: {0}")]
    Relay(#[from] RelayError),
}

impl CheckoutError {
    /// Text to show the shopper.
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(DomainError::Validation(msg)) => msg.clone(),
            Self::Invalid(other) => other.to_string(),
            Self::Relay(_) => ORDER_FAILED_MESSAGE.to_string(),
        }
    }
}

/// Places orders through an [`OrderRelay`].
#[derive(Debug, Clone)]
pub struct Checkout<R> {
    relay: R,
    currency: String,
}

impl<R: OrderRelay> Checkout<R> {
    pub fn new(relay: R, currency: impl Into<String>) -> Self {
        Self {
            relay,
            currency: currency.into(),
        }
    }

    /// Submit the cart in `store` as a paid order.
    ///
    /// The cart is cleared only after the relay confirms the order; on any
    /// failure it is left untouched so the shopper can retry or contact support.
    pub async fn complete<S: StorageSlot>(
        &self,
        store: &CartStore<S>,
        customer: CustomerContact,
        payment: PaymentConfirmation,
    ) -> Result<OrderConfirmation, CheckoutError> {
        let snapshot = store.snapshot();
        let request =
            OrderRequest::from_snapshot(customer, &snapshot, payment, self.currency.clone())?;

        tracing::info!(
            attempt_id = %request.attempt_id,
            customer = %request.customer.full_name(),
            lines = request.lines.len(),
            items = request.item_count(),
            total = %request.total,
            currency = %request.currency,
            "submitting order"
        );

        match self.relay.submit(&request).await {
            Ok(confirmation) => {
                tracing::info!(
                    attempt_id = %request.attempt_id,
                    order_id = %confirmation.order_id,
                    "order created; clearing cart"
                );
                store.clear();
                Ok(confirmation)
            }
            Err(err) => {
                tracing::error!(
                    attempt_id = %request.attempt_id,
                    payment_reference = %request.payment.reference,
                    error = %err,
                    "payment captured but order creation failed"
                );
                Err(err.into())
            }
        }
    }
}
