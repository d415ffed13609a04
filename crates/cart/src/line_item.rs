use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, Entity, Money, ProductId};

/// Identity of a cart line: the (product, color, size) triple.
///
/// Two selections with the same triple are the same line item. Equality is
/// structural, so `("a-b", "c")` and `("a", "b-c")` stay distinct even though
/// they render to the same display string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemId {
    product_id: ProductId,
    color: String,
    size: String,
}

impl LineItemId {
    pub fn new(product_id: ProductId, color: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            product_id,
            color: color.into(),
            size: size.into(),
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn size(&self) -> &str {
        &self.size
    }
}

impl core::fmt::Display for LineItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}-{}", self.product_id, self.color, self.size)
    }
}

/// A line item candidate: everything the UI knows at add-to-cart time.
///
/// Display fields are a snapshot; later catalog edits do not reach the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSelection {
    pub product_id: ProductId,
    pub name: String,
    /// Captured price (sale price if the product was on sale).
    pub unit_price: Money,
    pub image: String,
    pub color: String,
    pub size: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl ItemSelection {
    pub fn line_item_id(&self) -> LineItemId {
        LineItemId::new(self.product_id, self.color.clone(), self.size.clone())
    }
}

/// One distinct selection in the cart, with its quantity.
///
/// Persisted as a flat camelCase record; the identity is recomputed from
/// the triple on load and a zero quantity is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LineItemRecord", into = "LineItemRecord")]
pub struct LineItem {
    id: LineItemId,
    selection: ItemSelection,
    quantity: u32,
}

impl LineItem {
    /// A freshly added line (quantity 1).
    pub fn from_selection(selection: ItemSelection) -> Self {
        Self {
            id: selection.line_item_id(),
            selection,
            quantity: 1,
        }
    }

    /// Rebuild a line with an explicit quantity (e.g. from storage).
    pub fn with_quantity(selection: ItemSelection, quantity: u32) -> Result<Self, DomainError> {
        if quantity == 0 {
            return Err(DomainError::validation("line item quantity must be at least 1"));
        }
        Ok(Self {
            id: selection.line_item_id(),
            selection,
            quantity,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.selection.product_id
    }

    pub fn name(&self) -> &str {
        &self.selection.name
    }

    pub fn unit_price(&self) -> Money {
        self.selection.unit_price
    }

    pub fn image(&self) -> &str {
        &self.selection.image
    }

    pub fn color(&self) -> &str {
        &self.selection.color
    }

    pub fn size(&self) -> &str {
        &self.selection.size
    }

    pub fn slug(&self) -> &str {
        &self.selection.slug
    }

    pub fn brand(&self) -> Option<&str> {
        self.selection.brand.as_deref()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`.
    pub fn line_total(&self) -> Money {
        self.selection.unit_price.times(self.quantity)
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

impl Entity for LineItem {
    type Id = LineItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineItemRecord {
    product_id: ProductId,
    name: String,
    unit_price: Money,
    #[serde(default)]
    image: String,
    color: String,
    size: String,
    #[serde(default)]
    slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    brand: Option<String>,
    quantity: u32,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = DomainError;

    fn try_from(r: LineItemRecord) -> Result<Self, Self::Error> {
        let selection = ItemSelection {
            product_id: r.product_id,
            name: r.name,
            unit_price: r.unit_price,
            image: r.image,
            color: r.color,
            size: r.size,
            slug: r.slug,
            brand: r.brand,
        };
        LineItem::with_quantity(selection, r.quantity)
    }
}

impl From<LineItem> for LineItemRecord {
    fn from(item: LineItem) -> Self {
        let s = item.selection;
        Self {
            product_id: s.product_id,
            name: s.name,
            unit_price: s.unit_price,
            image: s.image,
            color: s.color,
            size: s.size,
            slug: s.slug,
            brand: s.brand,
            quantity: item.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(color: &str, size: &str) -> ItemSelection {
        ItemSelection {
            product_id: ProductId::new(1),
            name: "Linen Shirt".to_string(),
            unit_price: Money::from_minor(4990),
            image: "https://cdn.example/shirt.jpg".to_string(),
            color: color.to_string(),
            size: size.to_string(),
            slug: "linen-shirt".to_string(),
            brand: None,
        }
    }

    #[test]
    fn identity_display_joins_the_triple_with_dashes() {
        let id = selection("red", "m").line_item_id();
        assert_eq!(id.to_string(), "1-red-m");
    }

    #[test]
    fn identity_is_structural_not_textual() {
        let a = selection("navy-blue", "m").line_item_id();
        let b = LineItemId::new(ProductId::new(1), "navy", "blue-m");
        assert_eq!(a.to_string(), b.to_string());
        assert_ne!(a, b);
    }

    #[test]
    fn persisted_record_uses_camel_case_and_decimal_prices() {
        let item = LineItem::from_selection(selection("red", "m"));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["productId"], 1);
        assert_eq!(json["unitPrice"], "49.90");
        assert_eq!(json["quantity"], 1);
        assert!(json.get("brand").is_none());
    }

    #[test]
    fn zero_quantity_record_is_rejected() {
        let raw = r#"{"productId":1,"name":"x","unitPrice":"1.00","image":"","color":"c","size":"s","quantity":0}"#;
        assert!(serde_json::from_str::<LineItem>(raw).is_err());
    }

    #[test]
    fn identity_is_recomputed_on_load() {
        let raw = r#"{"id":"stale","productId":9,"name":"x","unitPrice":"1.00","image":"","color":"Black","size":"L","quantity":2}"#;
        let item: LineItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.id(), &LineItemId::new(ProductId::new(9), "Black", "L"));
        assert_eq!(item.quantity(), 2);
        assert_eq!(item.slug(), "");
    }
}
