//! Product records and the rules that guard them.
//!
//! A product is the only persistent entity in the inventory application.  The
//! bridge never stores one; it only carries the RFID tag that the web side
//! uses to find a product and bump its stock.
//!
//! ```text
//! RFID_RESULT { epc } ──► find_by_rfid_tag(epc) ──► quantity + 1
//!                                   │
//!                                   └─ not found ──► new-product form, tag pre-filled
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A stocked product.
///
/// Field names are camel-cased on the wire to match the web UI's types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    /// Display name; never blank.
    pub name: String,
    /// Units in stock; never negative.
    pub quantity: i64,
    /// EPC (or TID) of the tag attached to this product, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfid_tag: Option<String>,
    /// Creation time, milliseconds since the Unix epoch.
    pub created_at: u64,
    /// Last modification time, milliseconds since the Unix epoch.
    pub updated_at: u64,
}

/// User-supplied fields for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfid_tag: Option<String>,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, quantity: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            rfid_tag: None,
        }
    }

    pub fn with_rfid_tag(mut self, tag: impl Into<String>) -> Self {
        self.rfid_tag = Some(tag.into());
        self
    }
}

/// A single rule violation found by [`ProductValidator`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProductFieldError {
    #[error("product name must not be empty")]
    EmptyName,

    #[error("quantity must be zero or greater, got {0}")]
    NegativeQuantity(i64),
}

/// Validates product input before it reaches the store.
///
/// Every rule is checked; all violations are returned together so a form can
/// show them at once.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductValidator;

impl ProductValidator {
    /// The name must contain at least one non-whitespace character.
    pub fn validate_name(&self, name: &str) -> Result<(), ProductFieldError> {
        if name.trim().is_empty() {
            return Err(ProductFieldError::EmptyName);
        }
        Ok(())
    }

    /// The quantity must be zero or greater.
    pub fn validate_quantity(&self, quantity: i64) -> Result<(), ProductFieldError> {
        if quantity < 0 {
            return Err(ProductFieldError::NegativeQuantity(quantity));
        }
        Ok(())
    }

    /// Checks every field of `input`.
    ///
    /// # Errors
    ///
    /// Returns all violations, in field order, when any rule fails.
    pub fn validate_product(&self, input: &ProductInput) -> Result<(), Vec<ProductFieldError>> {
        let errors: Vec<ProductFieldError> = [
            self.validate_name(&input.name),
            self.validate_quantity(input.quantity),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
