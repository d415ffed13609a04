use serde::{Deserialize, Deserializer, Serialize};

use storefront_cart::ItemSelection;
use storefront_core::{DomainError, DomainResult, Money, ProductId};

/// Color recorded when the product has no variants to choose from.
pub const DEFAULT_COLOR: &str = "Default";

/// Size recorded when the product is not sized.
pub const DEFAULT_SIZE: &str = "One Size";

/// Apparel sizes; a product declaring any of these requires a size choice.
pub const STANDARD_SIZES: [&str; 6] = ["xs", "s", "m", "l", "xl", "xxl"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImage {
    pub src: String,
}

/// Extra product fields maintained in the CMS (brand, size chart).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductExtras {
    #[serde(default)]
    pub brand_name: Option<String>,
    #[serde(default)]
    pub available_sizes: Vec<String>,
}

/// Read-only product record (commerce backend JSON shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub regular_price: Money,
    #[serde(default, deserialize_with = "blank_price_as_none")]
    pub sale_price: Option<Money>,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub images: Vec<CatalogImage>,
    #[serde(default, rename = "carbon_fields")]
    pub extras: ProductExtras,
}

fn blank_price_as_none<'de, D>(deserializer: D) -> Result<Option<Money>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Money::parse_decimal(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// A shopper's choice, if they made a non-blank one.
fn chosen(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl CatalogProduct {
    /// Price a shopper pays right now: the sale price while on sale, else the regular price.
    pub fn effective_price(&self) -> Money {
        match (self.on_sale, self.sale_price) {
            (true, Some(sale)) => sale,
            _ => self.regular_price,
        }
    }

    /// Whole-percent discount shown next to sale prices (0 when not discounted).
    pub fn discount_percent(&self) -> u64 {
        let regular = u128::from(self.regular_price.minor_units());
        let effective = u128::from(self.effective_price().minor_units());
        if regular == 0 || effective >= regular {
            return 0;
        }
        // Rounded to nearest whole percent.
        (((regular - effective) * 200 + regular) / (2 * regular)) as u64
    }

    /// Whether the product declares any standard apparel size.
    pub fn requires_size(&self) -> bool {
        self.extras.available_sizes.iter().any(|declared| {
            let declared = declared.trim().to_ascii_lowercase();
            STANDARD_SIZES.contains(&declared.as_str())
        })
    }

    pub fn brand(&self) -> Option<&str> {
        self.extras
            .brand_name
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Build the cart selection for what the shopper picked on the product page.
    ///
    /// Captures [`effective_price`](Self::effective_price) and snapshots the
    /// display fields. Missing choices fall back to [`DEFAULT_COLOR`],
    /// [`DEFAULT_SIZE`] and the first product image, except that sized
    /// products refuse a selection without a size.
    pub fn select(
        &self,
        variant: Option<&str>,
        size: Option<&str>,
        image: Option<&str>,
    ) -> DomainResult<ItemSelection> {
        let size = match chosen(size) {
            Some(size) => size.to_string(),
            None if self.requires_size() => {
                return Err(DomainError::validation("please select a size"));
            }
            None => DEFAULT_SIZE.to_string(),
        };

        let image = chosen(image)
            .map(str::to_string)
            .or_else(|| self.images.first().map(|img| img.src.clone()))
            .unwrap_or_default();

        Ok(ItemSelection {
            product_id: self.id,
            name: self.name.clone(),
            unit_price: self.effective_price(),
            image,
            color: chosen(variant).unwrap_or(DEFAULT_COLOR).to_string(),
            size,
            slug: self.slug.clone(),
            brand: self.brand().map(str::to_string),
        })
    }
}
