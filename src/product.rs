//! # Product model
//! Typed catalog records plus the parsing boundary for remote JSON.
//!
//! Remote records are checked field by field; anything malformed is rejected
//! with a [`RecordError`] instead of being coerced into shape.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::ProductId;

/// Product category. The four named variants are the set offered when creating
/// a product; remote records may carry anything else and keep it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Electronics,
    Jewelery,
    MensClothing,
    WomensClothing,
    Other(String),
}

impl Category {
    /// Categories a user may pick when creating or editing a product.
    pub const SELECTABLE: [Category; 4] = [
        Category::Electronics,
        Category::Jewelery,
        Category::MensClothing,
        Category::WomensClothing,
    ];

    /// Parse only the selectable set (form input).
    pub fn parse_selectable(s: &str) -> Option<Category> {
        match Category::from(s.trim().to_string()) {
            Category::Other(_) => None,
            known => Some(known),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Electronics => "electronics",
            Category::Jewelery => "jewelery",
            Category::MensClothing => "men's clothing",
            Category::WomensClothing => "women's clothing",
            Category::Other(s) => s,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Category::Electronics => "Electronics",
            Category::Jewelery => "Jewelery",
            Category::MensClothing => "Men's Clothing",
            Category::WomensClothing => "Women's Clothing",
            Category::Other(s) => s,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.as_str() {
            "electronics" => Category::Electronics,
            "jewelery" => Category::Jewelery,
            "men's clothing" => Category::MensClothing,
            "women's clothing" => Category::WomensClothing,
            _ => Category::Other(s),
        }
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: u64,
}

impl Rating {
    pub const ZERO: Rating = Rating { rate: 0.0, count: 0 };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: Category,
    pub rating: Rating,
}

/// The full set of user-editable fields. Create and form-driven update both take one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub price: f64,
    pub description: String,
    pub image: String,
    pub category: Category,
}

/// Field-wise merge applied by the store's update; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl ProductPatch {
    pub fn price(price: f64) -> Self {
        Self {
            price: Some(price),
            ..Self::default()
        }
    }
}

impl From<ProductDraft> for ProductPatch {
    fn from(d: ProductDraft) -> Self {
        Self {
            title: Some(d.title),
            price: Some(d.price),
            description: Some(d.description),
            image: Some(d.image),
            category: Some(d.category),
        }
    }
}

impl Product {
    /// A locally created product always starts unrated.
    pub fn from_draft(id: ProductId, draft: ProductDraft) -> Self {
        Self {
            id,
            title: draft.title,
            price: draft.price,
            description: draft.description,
            image: draft.image,
            category: draft.category,
            rating: Rating::ZERO,
        }
    }

    /// Merge `patch` over this product. Id and rating never change.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.price {
            self.price = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.image {
            self.image = v;
        }
        if let Some(v) = patch.category {
            self.category = v;
        }
    }

    /// Parse one remote JSON record. `rating` may be absent (treated as zero);
    /// every other field is required and checked.
    pub fn from_remote(value: serde_json::Value) -> Result<Product, RecordError> {
        #[derive(Deserialize)]
        struct Wire {
            id: u64,
            title: String,
            price: f64,
            description: String,
            image: String,
            category: String,
            #[serde(default)]
            rating: Option<Rating>,
        }

        let w: Wire =
            serde_json::from_value(value).map_err(|e| RecordError::Shape(e.to_string()))?;
        let id = ProductId(w.id);

        require_text(id, "title", &w.title)?;
        require_text(id, "description", &w.description)?;
        require_text(id, "category", &w.category)?;
        if !w.price.is_finite() || w.price <= 0.0 {
            return Err(RecordError::Price { id, price: w.price });
        }

        Ok(Product {
            id,
            title: w.title,
            price: w.price,
            description: w.description,
            image: w.image,
            category: Category::from(w.category),
            rating: w.rating.unwrap_or_default(),
        })
    }
}

fn require_text(id: ProductId, field: &'static str, v: &str) -> Result<(), RecordError> {
    if v.trim().is_empty() {
        Err(RecordError::Blank { id, field })
    } else {
        Ok(())
    }
}

/// Why a remote record was refused at the parsing boundary.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("record has the wrong shape: {0}")]
    Shape(String),
    #[error("product {id}: field '{field}' is blank")]
    Blank { id: ProductId, field: &'static str },
    #[error("product {id}: price {price} is not a positive number")]
    Price { id: ProductId, price: f64 },
    #[error("product {0}: duplicate id in response")]
    Duplicate(ProductId),
}
