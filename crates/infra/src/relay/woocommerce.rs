//! WooCommerce REST relay: creates a paid order for a checked-out cart.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use storefront_orders::{OrderConfirmation, OrderRelay, OrderRequest, RelayError};

use crate::config::WooCommerceSettings;

// The storefront sells online only; WooCommerce still wants a postal address.
const PLACEHOLDER_ADDRESS: &str = "Online Order";
const PLACEHOLDER_CITY: &str = "Web";
const PLACEHOLDER_STATE: &str = "Web";
const PLACEHOLDER_POSTCODE: &str = "00000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WooBilling {
    pub first_name: String,
    pub last_name: String,
    pub address_1: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WooMeta {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WooLineItem {
    pub product_id: u64,
    pub quantity: u32,
    pub meta_data: Vec<WooMeta>,
}

/// Body of `POST /wc/v3/orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WooOrderPayload {
    pub payment_method: String,
    pub payment_method_title: String,
    pub set_paid: bool,
    pub billing: WooBilling,
    pub line_items: Vec<WooLineItem>,
    pub customer_note: String,
}

impl WooOrderPayload {
    /// Map an order request onto the WooCommerce order shape.
    pub fn from_request(request: &OrderRequest, billing_country: &str) -> Self {
        let provider = request.payment.provider.trim();
        let title = payment_method_title(provider);
        let customer = &request.customer;

        Self {
            payment_method: provider.to_string(),
            customer_note: format!("{title} Order ID: {}", request.payment.reference.trim()),
            payment_method_title: title,
            set_paid: true,
            billing: WooBilling {
                first_name: customer.first_name.trim().to_string(),
                last_name: customer.last_name.trim().to_string(),
                address_1: PLACEHOLDER_ADDRESS.to_string(),
                city: PLACEHOLDER_CITY.to_string(),
                state: PLACEHOLDER_STATE.to_string(),
                postcode: PLACEHOLDER_POSTCODE.to_string(),
                country: billing_country.to_string(),
                email: customer.email.trim().to_string(),
                phone: customer.phone.trim().to_string(),
            },
            line_items: request
                .lines
                .iter()
                .map(|line| WooLineItem {
                    product_id: line.product_id.get(),
                    quantity: line.quantity,
                    meta_data: line
                        .metadata()
                        .into_iter()
                        .map(|(key, value)| WooMeta {
                            key: key.to_string(),
                            value: value.to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn payment_method_title(provider: &str) -> String {
    match provider {
        "paypal" => "PayPal".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct WooOrderResponse {
    id: u64,
    #[serde(default)]
    status: Option<String>,
}

/// [`OrderRelay`] that creates orders through the WooCommerce REST API.
#[derive(Debug, Clone)]
pub struct WooCommerceRelay {
    client: reqwest::Client,
    endpoint: Url,
    billing_country: String,
}

impl WooCommerceRelay {
    /// Build from settings; fails naming the first missing variable.
    pub fn from_settings(settings: &WooCommerceSettings) -> Result<Self, RelayError> {
        let site_url = settings
            .site_url
            .as_deref()
            .ok_or_else(|| RelayError::NotConfigured("WORDPRESS_SITE_URL is not set".to_string()))?;
        let key = settings.consumer_key.as_deref().ok_or_else(|| {
            RelayError::NotConfigured("WOOCOMMERCE_CONSUMER_KEY is not set".to_string())
        })?;
        let secret = settings.consumer_secret.as_deref().ok_or_else(|| {
            RelayError::NotConfigured("WOOCOMMERCE_CONSUMER_SECRET is not set".to_string())
        })?;

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: orders_endpoint(site_url, key, secret)?,
            billing_country: settings.billing_country.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `{site}/index.php?rest_route=/wc/v3/orders&consumer_key=..&consumer_secret=..`
fn orders_endpoint(site_url: &str, key: &str, secret: &str) -> Result<Url, RelayError> {
    let base = format!("{}/index.php", site_url.trim_end_matches('/'));
    Url::parse_with_params(
        &base,
        &[
            ("rest_route", "/wc/v3/orders"),
            ("consumer_key", key),
            ("consumer_secret", secret),
        ],
    )
    .map_err(|e| RelayError::NotConfigured(format!("invalid WORDPRESS_SITE_URL: {e}")))
}

#[async_trait]
impl OrderRelay for WooCommerceRelay {
    async fn submit(&self, request: &OrderRequest) -> Result<OrderConfirmation, RelayError> {
        let payload = WooOrderPayload::from_request(request, &self.billing_country);

        tracing::debug!(
            attempt_id = %request.attempt_id,
            lines = payload.line_items.len(),
            "posting order to WooCommerce"
        );

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| RelayError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RelayError::Rejected {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let order: WooOrderResponse = resp
            .json()
            .await
            .map_err(|e| RelayError::Parse(e.to_string()))?;

        Ok(OrderConfirmation {
            order_id: order.id.to_string(),
            status: order.status,
            received_at: Utc::now(),
        })
    }
}
