//! Order relay seam (forwarding paid orders to the commerce backend).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::order::{OrderConfirmation, OrderRequest};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("order relay is not configured: {0}")]
    NotConfigured(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("backend rejected order ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("parse error: {0}")]
    Parse(String),
}

/// Forwards a paid order to the commerce backend.
///
/// Implementations are transport-specific (REST, test doubles). The relay only
/// reports success or failure; clearing the cart is the caller's decision.
#[async_trait]
pub trait OrderRelay: Send + Sync {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderConfirmation, RelayError>;
}

#[async_trait]
impl<R> OrderRelay for Arc<R>
where
    R: OrderRelay + ?Sized,
{
    async fn submit(&self, request: &OrderRequest) -> Result<OrderConfirmation, RelayError> {
        (**self).submit(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    struct Fixed;

    #[async_trait]
    impl OrderRelay for Fixed {
        async fn submit(&self, request: &OrderRequest) -> Result<OrderConfirmation, RelayError> {
            Ok(OrderConfirmation {
                order_id: format!("order-for-{}", request.lines.len()),
                status: None,
                received_at: Utc::now(),
            })
        }
    }

    #[test]
    fn rejected_error_renders_status_and_body() {
        let err = RelayError::Rejected {
            status: 400,
            body: r#"{"code":"woocommerce_rest_invalid_product_id"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"backend rejected order (400): {"code":"woocommerce_rest_invalid_product_id"}"#
        );
    }

    #[tokio::test]
    async fn arc_wrapped_relay_delegates() {
        use crate::{CustomerContact, PaymentConfirmation};
        use storefront_core::{CheckoutAttemptId, Money};

        let relay: Arc<dyn OrderRelay> = Arc::new(Fixed);
        let request = OrderRequest {
            attempt_id: CheckoutAttemptId::new(),
            customer: CustomerContact::default(),
            lines: vec![],
            total: Money::ZERO,
            currency: "ILS".to_string(),
            payment: PaymentConfirmation::paypal("ref"),
        };

        let confirmation = Arc::new(relay).submit(&request).await.unwrap();
        assert_eq!(confirmation.order_id, "order-for-0");
    }
}
