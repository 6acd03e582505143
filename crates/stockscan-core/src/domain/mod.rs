//! Domain entities for StockScan.
//!
//! Pure business rules with no infrastructure dependencies: the product
//! record the inventory screens edit, and the validation rules applied before
//! a product is created or updated.

use std::time::{SystemTime, UNIX_EPOCH};

/// Product records and their validation rules.
pub mod product;

/// Milliseconds since the Unix epoch, the timestamp unit used on the wire.
///
/// Returns 0 if the system clock is set before 1970.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
