//! pay-products - Products and payment links for a payments API
//!
//! Products are purchasable payment links. Paying for a product creates a
//! payment through the public payments API and records its outcome.
//!
//! # Architecture
//!
//! Business operations run as transaction flows:
//! - Each transactional step runs in its own database transaction
//! - Non-transactional steps (network calls) run with no transaction open
//! - Steps hand results to later steps through a typed result context
//! - The first failing step halts the flow; committed steps stay committed
//!
//! # Modules
//!
//! - `adapters`: Payments API integration
//! - `core`: Transaction flow orchestration (Step, TransactionFlow, ResultContext)
//! - `domain`: Data structures (Product, Payment, Link)
//! - `service`: Business operations (PaymentCreator, ProductFinder, ...)
//! - `store`: SQLite persistence
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! pay-products init
//! pay-products product create --gateway-account-id 1 --name "Fee" --price 1050 --api-token $TOKEN
//! pay-products pay 1
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ids;
pub mod service;
pub mod store;

// Re-export main types at crate root for convenience
pub use core::{FlowError, FlowRun, ResultContext, Step, TransactionFlow};
pub use domain::{Payment, PaymentStatus, Product, ProductStatus};
pub use service::{PaymentCreator, ServiceError};
