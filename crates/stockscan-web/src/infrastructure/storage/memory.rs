//! In-memory product store.
//!
//! Products live in a `Vec` behind a `parking_lot::RwLock`, in creation
//! order.  A tag may be assigned to at most one product so that a scan
//! always resolves to a single record.

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use stockscan_core::domain::product::{Product, ProductInput};
use stockscan_core::domain::unix_millis;

use crate::application::manage_products::{ProductRepository, StoreError};

#[derive(Default)]
pub struct InMemoryProductStore {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled from `inputs`.  Inputs whose tag is already
    /// taken are skipped.
    pub fn seeded(inputs: impl IntoIterator<Item = ProductInput>) -> Self {
        let store = Self::new();
        for input in inputs {
            if let Err(e) = store.create(input) {
                debug!("skipping seed product: {e}");
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }
}

fn tag_taken(products: &[Product], tag: Option<&str>, except: Option<Uuid>) -> bool {
    tag.is_some_and(|tag| {
        products
            .iter()
            .any(|p| Some(p.id) != except && p.rfid_tag.as_deref() == Some(tag))
    })
}

impl ProductRepository for InMemoryProductStore {
    fn list(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.products.read().clone())
    }

    fn get(&self, id: Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self.products.read().iter().find(|p| p.id == id).cloned())
    }

    fn create(&self, input: ProductInput) -> Result<Product, StoreError> {
        let mut products = self.products.write();
        if tag_taken(&products, input.rfid_tag.as_deref(), None) {
            return Err(StoreError::DuplicateTag(input.rfid_tag.unwrap_or_default()));
        }
        let now = unix_millis();
        let product = Product {
            id: Uuid::new_v4(),
            name: input.name,
            quantity: input.quantity,
            rfid_tag: input.rfid_tag,
            created_at: now,
            updated_at: now,
        };
        products.push(product.clone());
        Ok(product)
    }

    fn update(&self, id: Uuid, input: ProductInput) -> Result<Product, StoreError> {
        let mut products = self.products.write();
        if tag_taken(&products, input.rfid_tag.as_deref(), Some(id)) {
            return Err(StoreError::DuplicateTag(input.rfid_tag.unwrap_or_default()));
        }
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound(id))?;
        product.name = input.name;
        product.quantity = input.quantity;
        product.rfid_tag = input.rfid_tag;
        product.updated_at = unix_millis().max(product.created_at);
        Ok(product.clone())
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut products = self.products.write();
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn find_by_rfid_tag(&self, tag: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .read()
            .iter()
            .find(|p| p.rfid_tag.as_deref() == Some(tag))
            .cloned())
    }
}
