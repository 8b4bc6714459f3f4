//! Product form: raw user input and the validation that runs before the store
//! is touched. The store itself trusts its input.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::product::{Category, Product, ProductDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Title,
    Price,
    Description,
    Image,
    Category,
}

/// Raw form input; every field arrives as text, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub title: String,
    #[serde(deserialize_with = "text_or_number")]
    pub price: String,
    pub description: String,
    pub image: String,
    pub category: String,
}

/// JSON clients may send the price as a number; keep it as typed text either way.
fn text_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }
    Ok(match Raw::deserialize(d)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<FormField, String>);

impl FormErrors {
    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn add(&mut self, field: FormField, msg: &str) {
        self.0.insert(field, msg.to_string());
    }
}

impl ProductForm {
    /// Edit mode: pre-fill from an existing product.
    pub fn from_product(p: &Product) -> Self {
        Self {
            title: p.title.clone(),
            price: p.price.to_string(),
            description: p.description.clone(),
            image: p.image.clone(),
            category: p.category.as_str().to_string(),
        }
    }

    /// Check every field and collect all problems, or produce a draft.
    pub fn validate(&self) -> Result<ProductDraft, FormErrors> {
        let mut errors = FormErrors::default();

        if self.title.trim().is_empty() {
            errors.add(FormField::Title, "Title is required");
        }

        let price = self
            .price
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0);
        if price.is_none() {
            errors.add(FormField::Price, "Please enter a valid price greater than 0");
        }

        if self.description.trim().is_empty() {
            errors.add(FormField::Description, "Description is required");
        }
        if self.image.trim().is_empty() {
            errors.add(FormField::Image, "Image URL is required");
        }

        let category = if self.category.trim().is_empty() {
            errors.add(FormField::Category, "Category is required");
            None
        } else {
            let c = Category::parse_selectable(&self.category);
            if c.is_none() {
                errors.add(FormField::Category, "Please select a valid category");
            }
            c
        };

        match (price, category) {
            (Some(price), Some(category)) if errors.is_empty() => Ok(ProductDraft {
                title: self.title.clone(),
                price,
                description: self.description.clone(),
                image: self.image.clone(),
                category,
            }),
            _ => Err(errors),
        }
    }
}
