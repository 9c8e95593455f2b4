use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{AdvisorError, Result};

/// A catalog entry. The name doubles as its identity.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub image: String, // URL or path of the product shot
}

/// The static product list, loaded once at startup.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Catalog {
    pub products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Loads the catalog from a file path or an http(s) URL.
    pub async fn load(source: &str) -> Result<Self> {
        info!(source, "Loading catalog");
        let raw: Value = if source.starts_with("http://") || source.starts_with("https://") {
            reqwest::get(source)
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| AdvisorError::Catalog(format!("{source}: {e}")))?
                .json::<Value>()
                .await
                .map_err(|e| AdvisorError::Catalog(format!("{source}: {e}")))?
        } else {
            let text = tokio::fs::read_to_string(source)
                .await
                .map_err(|e| AdvisorError::Catalog(format!("{source}: {e}")))?;
            serde_json::from_str(&text)?
        };
        let catalog = Self::from_value(raw)?;
        info!(count = catalog.products.len(), "Catalog loaded");
        Ok(catalog)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Validates the document against the catalog schema before decoding it.
    pub fn from_value(raw: Value) -> Result<Self> {
        let validator = jsonschema::validator_for(&catalog_schema())
            .map_err(|e| AdvisorError::Schema(e.to_string()))?;
        if let Some(err) = validator.iter_errors(&raw).next() {
            return Err(AdvisorError::Schema(err.to_string()));
        }
        let catalog: Catalog = serde_json::from_value(raw)?;
        debug!(count = catalog.products.len(), "Catalog passed schema validation");
        Ok(catalog)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn find(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }
}

fn catalog_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "required": ["products"],
        "properties": {
            "products": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "brand", "category", "description", "image"],
                    "properties": {
                        "name": { "type": "string" },
                        "brand": { "type": "string" },
                        "category": { "type": "string" },
                        "description": { "type": "string" },
                        "image": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
pub(crate) fn sample(name: &str, category: &str, description: &str) -> Product {
    Product {
        name: name.to_string(),
        brand: "CeraVe".to_string(),
        category: category.to_string(),
        description: description.to_string(),
        image: format!("https://img.example.com/{}.jpg", name.to_lowercase().replace(' ', "-")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "products": [
            {"id": 1, "name": "Foaming Cleanser", "brand": "CeraVe", "category": "cleanser",
             "description": "Gel cleanser for normal to oily skin", "image": "a.jpg"},
            {"id": 2, "name": "Lash Sensational", "brand": "Maybelline", "category": "makeup",
             "description": "Volumizing mascara", "image": "b.jpg"}
        ]
    }"#;

    #[test]
    fn parses_catalog_and_ignores_extra_fields() {
        let catalog = Catalog::from_json_str(CATALOG).unwrap();
        assert_eq!(catalog.products().len(), 2);
        assert_eq!(catalog.find("Lash Sensational").unwrap().brand, "Maybelline");
        assert!(catalog.find("Nope").is_none());
    }

    #[test]
    fn rejects_document_without_products() {
        let err = Catalog::from_json_str(r#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, AdvisorError::Schema(_)));
    }

    #[test]
    fn rejects_product_missing_a_field() {
        let err = Catalog::from_json_str(
            r#"{"products": [{"name": "x", "brand": "y", "category": "z", "description": "d"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AdvisorError::Schema(_)));
    }

    #[tokio::test]
    async fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.json");
        std::fs::write(&path, CATALOG).unwrap();
        let catalog = Catalog::load(path.to_str().unwrap()).await.unwrap();
        assert_eq!(catalog.products()[0].name, "Foaming Cleanser");
    }

    #[tokio::test]
    async fn missing_file_is_a_catalog_error() {
        let err = Catalog::load("/definitely/not/here/products.json").await.unwrap_err();
        assert!(matches!(err, AdvisorError::Catalog(_)));
    }
}
