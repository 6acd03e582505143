//! RecordScanUseCase: turns a tag read into a stock change.
//!
//! ```text
//! RfidScanResult { epc }
//!        │
//!        ├─ product with rfid_tag == epc ─► quantity + 1 ─► Restocked(product)
//!        └─ none                          ─► Unknown { rfid_tag: epc }
//! ```
//!
//! `Unknown` is not an error: the page opens the new-product form with the
//! tag pre-filled.

use std::sync::Arc;

use tracing::{debug, info};

use stockscan_core::domain::product::{Product, ProductInput};
use stockscan_core::protocol::RfidScanResult;

use crate::application::manage_products::{ProductRepository, StoreError};

/// What a scan did to the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The tag belongs to a product whose stock was incremented.
    Restocked(Product),
    /// No product carries this tag.
    Unknown { rfid_tag: String },
}

pub struct RecordScanUseCase {
    repository: Arc<dyn ProductRepository>,
}

impl RecordScanUseCase {
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self { repository }
    }

    /// Applies one tag read.
    ///
    /// # Errors
    ///
    /// Propagates store failures; the scan is not retried.
    pub fn record(&self, result: &RfidScanResult) -> Result<ScanOutcome, StoreError> {
        let tag = result.epc.trim();
        let Some(product) = self.repository.find_by_rfid_tag(tag)? else {
            debug!("tag {tag} is not assigned to any product");
            return Ok(ScanOutcome::Unknown {
                rfid_tag: tag.to_string(),
            });
        };

        let restocked = self.repository.update(
            product.id,
            ProductInput {
                name: product.name,
                quantity: product.quantity.saturating_add(1),
                rfid_tag: product.rfid_tag,
            },
        )?;
        info!(
            "restocked {} to {} via tag {tag}",
            restocked.name, restocked.quantity
        );
        Ok(ScanOutcome::Restocked(restocked))
    }
}
