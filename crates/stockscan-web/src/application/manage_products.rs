//! Product management: the store port and the validating service in front
//! of it.
//!
//! The page never writes to the store directly.  Every create and update
//! goes through [`ProductService`], which runs [`ProductValidator`] first and
//! only then hands the input to the [`ProductRepository`].

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use stockscan_core::domain::product::{Product, ProductFieldError, ProductInput, ProductValidator};

/// Errors reported by a product store.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("product {0} not found")]
    NotFound(Uuid),

    #[error("RFID tag {0} is already assigned to another product")]
    DuplicateTag(String),

    #[error("product store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence port for products.
#[cfg_attr(test, mockall::automock)]
pub trait ProductRepository: Send + Sync {
    /// Every product, oldest first.
    fn list(&self) -> Result<Vec<Product>, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError>;

    fn create(&self, input: ProductInput) -> Result<Product, StoreError>;

    fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, StoreError>;

    fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    /// Finds the product whose tag equals `tag` exactly.
    fn find_by_rfid_tag(&self, tag: &str) -> Result<Option<Product>, StoreError>;
}

/// Errors from [`ProductService`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("invalid product: {}", format_field_errors(.0))]
    Invalid(Vec<ProductFieldError>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn format_field_errors(errors: &[ProductFieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validating front for a [`ProductRepository`].
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    validator: ProductValidator,
}

impl ProductService {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            repository,
            validator: ProductValidator,
        }
    }

    pub fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.repository.list()?)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Product>, ServiceError> {
        Ok(self.repository.get(id)?)
    }

    /// Case-insensitive substring search over name, tag and id.  A blank
    /// query returns every product.
    pub fn search(&self, query: &str) -> Result<Vec<Product>, ServiceError> {
        let query = query.trim().to_lowercase();
        let products = self.repository.list()?;
        if query.is_empty() {
            return Ok(products);
        }
        Ok(products
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&query)
                    || p
                        .rfid_tag
                        .as_deref()
                        .is_some_and(|tag| tag.to_lowercase().contains(&query))
                    || p.id.to_string().contains(&query)
            })
            .collect())
    }

    /// Validates and stores a new product.
    ///
    /// # Errors
    ///
    /// [`ServiceError::Invalid`] with every violated rule, or the store's
    /// error.
    pub fn create(&self, input: ProductInput) -> Result<Product, ServiceError> {
        self.validator
            .validate_product(&input)
            .map_err(ServiceError::Invalid)?;
        let product = self.repository.create(normalize(input))?;
        info!("created product {} ({})", product.name, product.id);
        Ok(product)
    }

    /// Validates and applies an edit.
    ///
    /// # Errors
    ///
    /// As [`create`](Self::create); [`StoreError::NotFound`] if `id` is gone.
    pub fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, ServiceError> {
        self.validator
            .validate_product(&input)
            .map_err(ServiceError::Invalid)?;
        Ok(self.repository.update(id, normalize(input))?)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.repository.delete(id)?;
        info!("deleted product {id}");
        Ok(())
    }
}

// Names are trimmed and a blank tag means "no tag".
fn normalize(mut input: ProductInput) -> ProductInput {
    input.name = input.name.trim().to_string();
    input.rfid_tag = input
        .rfid_tag
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty());
    input
}
