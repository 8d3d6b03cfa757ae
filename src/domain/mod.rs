//! Domain types for the products service.
//!
//! This module contains the core data structures:
//! - Product: A purchasable payment link
//! - Payment: An attempt to pay for a product
//! - Links: Presentation links for both
//! - ProductMetadata: Key-value pairs attached to a product
//! - PatchRequest: Partial product updates
//! - ProductUsageStat: Payment counts per product

pub mod links;
pub mod metadata;
pub mod patch;
pub mod payment;
pub mod product;
pub mod usage;
pub mod validation;

use thiserror::Error;

// Re-export commonly used types
pub use links::{Link, LinksDecorator};
pub use metadata::ProductMetadata;
pub use patch::PatchRequest;
pub use payment::{Payment, PaymentStatus};
pub use product::{Product, ProductStatus};
pub use usage::ProductUsageStat;
pub use validation::ValidationError;

/// A stored status string that matches no known status
#[derive(Debug, Error)]
#[error("Unknown status: {0}")]
pub struct UnknownStatus(pub String);
