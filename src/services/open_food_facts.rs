//! Open Food Facts client.
//!
//! Product lookups feed ingredient creation with a name, a base quantity,
//! a unit, and an image. The upstream data is community-maintained and
//! irregular, so normalization is defensive and lookup failures degrade to
//! "no result" instead of surfacing errors to the caller.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::entities::sea_orm_active_enums::MeasurementUnit;
use crate::errors::ServiceError;

pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Normalized product record served to the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductInfo {
    pub barcode: String,
    pub name: String,
    pub base_quantity: Decimal,
    pub unit: MeasurementUnit,
    pub categories: Vec<String>,
    pub image_url: String,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    status: Option<i32>,
    product: Option<RawProduct>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    products: Vec<RawProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProduct {
    #[serde(default)]
    code: String,
    product_name_fr: Option<String>,
    product_name: Option<String>,
    product_quantity: Option<serde_json::Value>,
    quantity: Option<String>,
    product_quantity_unit: Option<String>,
    categories: Option<String>,
    image_front_url: Option<String>,
    image_url: Option<String>,
}

#[derive(Clone)]
pub struct OpenFoodFactsClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("brigade-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::InternalError(format!("HTTP client build failed: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Looks a product up by barcode. Upstream failures and unknown
    /// barcodes both yield `None`.
    #[instrument(skip(self))]
    pub async fn product_by_barcode(&self, barcode: &str) -> Option<ProductInfo> {
        let url = format!("{}/api/v2/product/{}.json", self.base_url, barcode);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Product lookup for {} failed: {}", barcode, e);
                return None;
            }
        };
        if !response.status().is_success() {
            return None;
        }
        let body: ProductResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Product lookup for {} returned invalid JSON: {}", barcode, e);
                return None;
            }
        };
        if body.status != Some(1) {
            return None;
        }
        body.product.map(normalize)
    }

    /// Free-text product search. Failures yield an empty page.
    #[instrument(skip(self))]
    pub async fn search(&self, terms: &str, page: u32, page_size: u32) -> Vec<ProductInfo> {
        let url = format!("{}/api/v2/search", self.base_url);
        let response = match self
            .http
            .get(&url)
            .query(&[
                ("search_terms", terms),
                ("page", &page.max(1).to_string()),
                ("page_size", &page_size.clamp(1, 100).to_string()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Product search for '{}' failed: {}", terms, e);
                return Vec::new();
            }
        };
        if !response.status().is_success() {
            return Vec::new();
        }
        match response.json::<SearchResponse>().await {
            Ok(body) => body.products.into_iter().map(normalize).collect(),
            Err(e) => {
                warn!("Product search for '{}' returned invalid JSON: {}", terms, e);
                Vec::new()
            }
        }
    }
}

/// Normalizes a raw product: French name first, quantity from the numeric
/// field or the leading digits of the free-text one, loosely parsed unit
/// falling back to counting pieces.
fn normalize(raw: RawProduct) -> ProductInfo {
    let name = raw
        .product_name_fr
        .filter(|n| !n.trim().is_empty())
        .or(raw.product_name)
        .unwrap_or_default();

    let base_quantity = raw
        .product_quantity
        .as_ref()
        .and_then(parse_quantity_value)
        .or_else(|| raw.quantity.as_deref().and_then(leading_decimal))
        .unwrap_or(Decimal::ZERO);

    let unit = raw
        .product_quantity_unit
        .as_deref()
        .and_then(MeasurementUnit::parse_loose)
        .unwrap_or(MeasurementUnit::Unit);

    let categories = raw
        .categories
        .as_deref()
        .map(|value| {
            value
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let image_url = raw
        .image_front_url
        .filter(|u| !u.is_empty())
        .or(raw.image_url)
        .unwrap_or_default();

    ProductInfo {
        barcode: raw.code,
        name,
        base_quantity,
        unit,
        categories,
        image_url,
    }
}

/// `product_quantity` arrives as either a number or a numeric string.
fn parse_quantity_value(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Pulls the leading decimal number out of a free-text quantity ("330 ml",
/// "1.5L bottle").
fn leading_decimal(text: &str) -> Option<Decimal> {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == '.')
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    trimmed[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(json: serde_json::Value) -> RawProduct {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn normalize_prefers_french_name() {
        let product = normalize(raw(serde_json::json!({
            "code": "123",
            "product_name_fr": "Lait entier",
            "product_name": "Whole milk",
        })));
        assert_eq!(product.name, "Lait entier");
    }

    #[test]
    fn normalize_falls_back_to_generic_name_and_empty() {
        let product = normalize(raw(serde_json::json!({
            "code": "123",
            "product_name": "Whole milk",
        })));
        assert_eq!(product.name, "Whole milk");

        let product = normalize(raw(serde_json::json!({ "code": "123" })));
        assert_eq!(product.name, "");
    }

    #[test]
    fn normalize_reads_numeric_and_string_quantities() {
        let product = normalize(raw(serde_json::json!({
            "code": "1",
            "product_quantity": 330,
            "product_quantity_unit": "ml",
        })));
        assert_eq!(product.base_quantity, dec!(330));
        assert_eq!(product.unit, MeasurementUnit::Millilitre);

        let product = normalize(raw(serde_json::json!({
            "code": "1",
            "product_quantity": "1.5",
            "product_quantity_unit": "L",
        })));
        assert_eq!(product.base_quantity, dec!(1.5));
        assert_eq!(product.unit, MeasurementUnit::Litre);
    }

    #[test]
    fn normalize_extracts_leading_digits_from_quantity_text() {
        let product = normalize(raw(serde_json::json!({
            "code": "1",
            "quantity": "330 ml",
        })));
        assert_eq!(product.base_quantity, dec!(330));
    }

    #[test]
    fn normalize_defaults_quantity_and_unit() {
        let product = normalize(raw(serde_json::json!({
            "code": "1",
            "quantity": "a dozen",
            "product_quantity_unit": "stone",
        })));
        assert_eq!(product.base_quantity, Decimal::ZERO);
        assert_eq!(product.unit, MeasurementUnit::Unit);
    }

    #[test]
    fn normalize_splits_categories() {
        let product = normalize(raw(serde_json::json!({
            "code": "1",
            "categories": "Dairy, Milk , ,Beverages",
        })));
        assert_eq!(product.categories, vec!["Dairy", "Milk", "Beverages"]);
    }

    #[test]
    fn normalize_prefers_front_image() {
        let product = normalize(raw(serde_json::json!({
            "code": "1",
            "image_front_url": "https://img.example/front.jpg",
            "image_url": "https://img.example/any.jpg",
        })));
        assert_eq!(product.image_url, "https://img.example/front.jpg");
    }
}
