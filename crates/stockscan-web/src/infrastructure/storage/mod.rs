//! Product store implementations.
//!
//! Only an in-memory store ships with the crate; a database-backed store
//! implements the same
//! [`ProductRepository`](crate::application::manage_products::ProductRepository)
//! port.

pub mod memory;
