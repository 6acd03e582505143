//! Loopback run configuration.
//!
//! [`LoopbackConfig`] is a plain struct; the binary fills it from CLI
//! arguments and the shell's TOML file, tests build it directly.
//!
//! # Seed syntax
//!
//! Products are seeded from `NAME:QUANTITY[:TAG]` strings:
//!
//! ```text
//! Widget:10:E2801170000002015B8E5B5B
//! Gadget:0
//! ```

use std::time::Duration;

use thiserror::Error;

use stockscan_core::domain::product::ProductInput;
use stockscan_shell::infrastructure::storage::config::ShellConfig;

/// The tag the reader reports in the default run; it matches the default seed.
pub const DEFAULT_TAG: &str = "E2801170000002015B8E5B5B";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeedParseError {
    #[error("seed {0:?} must look like NAME:QUANTITY[:TAG]")]
    Shape(String),

    #[error("seed {seed:?} has a non-numeric quantity {quantity:?}")]
    Quantity { seed: String, quantity: String },
}

/// Everything a loopback run needs.
#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Settings shared with a real shell (web app URL, direction policy).
    pub shell: ShellConfig,
    /// Tags the simulated reader reports once scanning starts, in order.
    pub tags: Vec<String>,
    /// Whether reader hardware is present.
    pub scanner_available: bool,
    /// Products in the page's store before the run.
    pub seed: Vec<ProductInput>,
    /// Create a product for every unknown tag, as a user filling the
    /// pre-filled form would.
    pub register_unknown: bool,
    /// The page gives up waiting for the shell after this much silence.
    pub idle_timeout: Duration,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            shell: ShellConfig::default(),
            tags: vec![DEFAULT_TAG.to_string()],
            scanner_available: true,
            seed: vec![
                ProductInput::new("Widget", 10).with_rfid_tag(DEFAULT_TAG),
                ProductInput::new("Gadget", 0),
            ],
            register_unknown: false,
            idle_timeout: Duration::from_millis(500),
        }
    }
}

/// Parses one `NAME:QUANTITY[:TAG]` seed string.
///
/// # Errors
///
/// Returns [`SeedParseError`] when the string has the wrong number of parts
/// or the quantity is not an integer.  Validation of the values themselves
/// happens later, in the product service.
pub fn parse_seed(seed: &str) -> Result<ProductInput, SeedParseError> {
    let parts: Vec<&str> = seed.split(':').map(str::trim).collect();
    let (name, quantity, tag) = match parts.as_slice() {
        [name, quantity] => (*name, *quantity, None),
        [name, quantity, tag] => (*name, *quantity, Some(*tag)),
        _ => return Err(SeedParseError::Shape(seed.to_string())),
    };
    let quantity: i64 = quantity.parse().map_err(|_| SeedParseError::Quantity {
        seed: seed.to_string(),
        quantity: quantity.to_string(),
    })?;
    let input = ProductInput::new(name, quantity);
    Ok(match tag.filter(|t| !t.is_empty()) {
        Some(tag) => input.with_rfid_tag(tag),
        None => input,
    })
}
