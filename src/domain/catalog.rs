//! Live product catalog rows and the variant stock model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Remaining-stock level at which a low-stock notification is fired.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub product_name: String,
    pub regular_price: i64,
    pub sale_price: i64,
    pub discount: i64,
    pub rating: f64,
    pub is_new: bool,
    pub is_flash_sale: bool,
    pub stock: i32,
    pub weight: f64,
    pub extras: serde_json::Value,
    pub seller_id: Option<Uuid>,
}

/// The `extras` JSONB column. Unknown keys are preserved across rewrites so
/// a stock update never strips seller-supplied metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductExtras {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<ProductVariant>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    pub name: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub regular_price: i64,
    #[serde(default)]
    pub sale_price: i64,
}

impl ProductRow {
    /// Decodes `extras`, treating malformed JSON as an empty extras object
    /// rather than failing the whole operation.
    pub fn extras(&self) -> ProductExtras {
        serde_json::from_value(self.extras.clone()).unwrap_or_default()
    }
}

impl ProductExtras {
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Total stock across variants; must equal the product row's `stock`
    /// after every mutation of a variant-bearing product.
    pub fn variant_stock_sum(&self) -> i32 {
        self.variants.iter().map(|v| v.stock).sum()
    }
}

/// Discounted price: `round(regular - regular * discount / 100)`.
pub fn sale_price(regular: i64, discount_pct: i64) -> i64 {
    let regular = regular as f64;
    (regular - regular * discount_pct as f64 / 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sale_price_rounds() {
        assert_eq!(sale_price(1000, 10), 900);
        assert_eq!(sale_price(999, 15), 849); // 849.15 rounds down
        assert_eq!(sale_price(333, 25), 250); // 249.75 rounds up
        assert_eq!(sale_price(0, 30), 0);
    }

    #[test]
    fn extras_roundtrip_preserves_unknown_keys() {
        let raw = json!({
            "variants": [{"name": "M", "stock": 4, "regular_price": 500}],
            "color": "red",
            "material": "cotton"
        });
        let extras: ProductExtras = serde_json::from_value(raw).unwrap();
        assert_eq!(extras.variants.len(), 1);
        assert_eq!(extras.variant_stock_sum(), 4);

        let back = serde_json::to_value(&extras).unwrap();
        assert_eq!(back["color"], "red");
        assert_eq!(back["material"], "cotton");
    }

    #[test]
    fn malformed_extras_decode_as_empty() {
        let row = ProductRow {
            id: Uuid::new_v4(),
            product_name: "p".into(),
            regular_price: 100,
            sale_price: 100,
            discount: 0,
            rating: 0.0,
            is_new: false,
            is_flash_sale: false,
            stock: 0,
            weight: 1.0,
            extras: json!([1, 2, 3]),
            seller_id: None,
        };
        assert!(!row.extras().has_variants());
    }
}
