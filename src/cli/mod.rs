//! Command-line interface for pay-products.
//!
//! Provides commands for creating and inspecting products, creating payments
//! against them, and checking the database.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::adapters::PublicApiClient;
use crate::config::{self, ResolvedConfig};
use crate::domain::{LinksDecorator, PatchRequest};
use crate::ids::RandomIdGenerator;
use crate::service::{
    NewProduct, PaymentCreator, PaymentFinder, ProductCreator, ProductFinder,
    ProductMetadataService, ServiceError,
};
use crate::store::Database;

/// pay-products - Products and payment links on top of the payments API
#[derive(Parser, Debug)]
#[command(name = "pay-products")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and schema
    Init,

    /// Manage products
    Product {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Create a payment for a product
    Pay {
        /// Product database id
        product_id: i64,
    },

    /// Inspect payments
    Payment {
        #[command(subcommand)]
        command: PaymentCommands,
    },

    /// Check the database is reachable
    Health,

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// Create a new active product
    Create {
        #[arg(long)]
        gateway_account_id: i64,

        #[arg(long)]
        name: String,

        /// Price in pence
        #[arg(long)]
        price: i64,

        /// Payments API token used when paying for this product
        #[arg(long, env = "PAY_API_TOKEN")]
        api_token: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        return_url: Option<String>,
    },

    /// Show a product
    Show {
        /// Product external id
        external_id: String,

        /// Only match a product of this gateway account
        #[arg(long)]
        gateway_account_id: Option<i64>,
    },

    /// List active products of a gateway account
    List {
        gateway_account_id: i64,
    },

    /// Mark a product inactive
    Disable {
        /// Product external id
        external_id: String,

        /// Only match a product of this gateway account
        #[arg(long)]
        gateway_account_id: Option<i64>,
    },

    /// Delete a product and its metadata
    Delete {
        /// Product external id
        external_id: String,

        /// Only match a product of this gateway account
        #[arg(long)]
        gateway_account_id: Option<i64>,
    },

    /// Apply a patch, e.g. '{"op": "replace", "path": "pay_api_token", "value": "..."}'
    Patch {
        /// Product external id
        external_id: String,

        /// Patch operation as JSON
        patch: String,
    },

    /// Payment counts per product
    Usage {
        #[arg(long)]
        gateway_account_id: Option<i64>,
    },

    /// Manage product metadata
    Metadata {
        #[command(subcommand)]
        command: MetadataCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum MetadataCommands {
    /// List the key-value pairs of a product
    List { external_id: String },

    /// Add one pair, e.g. '{"colour": "blue"}'
    Add { external_id: String, pair: String },

    /// Replace the value of an existing key
    Update { external_id: String, pair: String },

    /// Remove a key
    Remove { external_id: String, key: String },
}

#[derive(Subcommand, Debug)]
pub enum PaymentCommands {
    /// Show a payment
    Show {
        /// Payment external id
        external_id: String,
    },

    /// Ask the payments API for the current state of a payment
    Status {
        /// Payment external id
        external_id: String,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        match self.command {
            Commands::Init => init(cfg),
            Commands::Product { command } => execute_product(cfg, command).await,
            Commands::Pay { product_id } => pay(cfg, product_id).await,
            Commands::Payment { command } => execute_payment(cfg, command).await,
            Commands::Health => health(cfg),
            Commands::Config => show_config(cfg),
        }
    }
}

fn links(cfg: &ResolvedConfig) -> LinksDecorator {
    LinksDecorator::new(
        cfg.links.products_api_url.clone(),
        cfg.links.products_ui_pay_url.clone(),
    )
}

/// Create the database file and schema
fn init(cfg: &ResolvedConfig) -> Result<()> {
    let database = Database::from_config(cfg);
    database.migrate()?;
    eprintln!("[Database ready at {}]", database.path().display());
    Ok(())
}

/// Execute product subcommands
async fn execute_product(cfg: &ResolvedConfig, command: ProductCommands) -> Result<()> {
    let database = Database::from_config(cfg);

    match command {
        ProductCommands::Create {
            gateway_account_id,
            name,
            price,
            api_token,
            description,
            return_url,
        } => {
            let creator =
                ProductCreator::new(database, Arc::new(RandomIdGenerator), links(cfg));
            let new_product = NewProduct {
                gateway_account_id,
                name,
                description,
                price,
                pay_api_token: api_token,
                return_url,
            };
            let product = creator.create(new_product).await.or_else(fail)?;
            print_json(&product)
        }
        ProductCommands::Show {
            external_id,
            gateway_account_id,
        } => {
            let finder = ProductFinder::new(database, links(cfg));
            let product = match gateway_account_id {
                Some(id) => finder.find_by_gateway_account_id_and_external_id(id, &external_id),
                None => finder.find_by_external_id(&external_id),
            };
            match product.or_else(fail)? {
                Some(product) => print_json(&product),
                None => not_found("product", &external_id),
            }
        }
        ProductCommands::List { gateway_account_id } => {
            let finder = ProductFinder::new(database, links(cfg));
            let products = finder
                .find_by_gateway_account_id(gateway_account_id)
                .or_else(fail)?;
            print_json(&products)
        }
        ProductCommands::Disable {
            external_id,
            gateway_account_id,
        } => {
            let finder = ProductFinder::new(database, links(cfg));
            let disabled = match gateway_account_id {
                Some(id) => {
                    finder
                        .disable_by_gateway_account_id_and_external_id(id, &external_id)
                        .await
                }
                None => finder.disable_product(&external_id).await,
            };
            match disabled.or_else(fail)? {
                Some(product) => print_json(&product),
                None => not_found("product", &external_id),
            }
        }
        ProductCommands::Delete {
            external_id,
            gateway_account_id,
        } => {
            let finder = ProductFinder::new(database, links(cfg));
            let deleted = match gateway_account_id {
                Some(id) => {
                    finder
                        .delete_by_gateway_account_id_and_external_id(id, &external_id)
                        .await
                }
                None => finder.delete_by_external_id(&external_id).await,
            };
            if deleted.or_else(fail)? {
                eprintln!("[Deleted product {}]", external_id);
                Ok(())
            } else {
                not_found("product", &external_id)
            }
        }
        ProductCommands::Patch { external_id, patch } => {
            let patch: PatchRequest =
                serde_json::from_str(&patch).context("Patch must be {op, path, value} JSON")?;
            let finder = ProductFinder::new(database, links(cfg));
            match finder.apply_patch(&external_id, &patch).await.or_else(fail)? {
                Some(product) => print_json(&product),
                None => not_found("product", &external_id),
            }
        }
        ProductCommands::Usage { gateway_account_id } => {
            let finder = ProductFinder::new(database, links(cfg));
            let stats = finder.usage_stats(gateway_account_id).or_else(fail)?;
            print_json(&stats)
        }
        ProductCommands::Metadata { command } => execute_metadata(database, command).await,
    }
}

/// Execute product metadata subcommands
async fn execute_metadata(database: Database, command: MetadataCommands) -> Result<()> {
    let service = ProductMetadataService::new(database);

    match command {
        MetadataCommands::List { external_id } => {
            match service.list(&external_id).or_else(fail)? {
                Some(metadata) => print_json(&metadata),
                None => not_found("product", &external_id),
            }
        }
        MetadataCommands::Add { external_id, pair } => {
            let payload = parse_pair(&pair)?;
            match service.add(&external_id, &payload).await.or_else(fail)? {
                Some(metadata) => print_json(&metadata),
                None => not_found("product", &external_id),
            }
        }
        MetadataCommands::Update { external_id, pair } => {
            let payload = parse_pair(&pair)?;
            match service.update(&external_id, &payload).await.or_else(fail)? {
                Some(metadata) => print_json(&metadata),
                None => not_found("product", &external_id),
            }
        }
        MetadataCommands::Remove { external_id, key } => {
            if service.remove(&external_id, &key).await.or_else(fail)? {
                eprintln!("[Removed {} from product {}]", key, external_id);
                Ok(())
            } else {
                not_found("metadata", &key)
            }
        }
    }
}

fn parse_pair(pair: &str) -> Result<serde_json::Value> {
    serde_json::from_str(pair).context("Metadata must be a JSON object")
}

/// Execute payment subcommands
async fn execute_payment(cfg: &ResolvedConfig, command: PaymentCommands) -> Result<()> {
    match command {
        PaymentCommands::Show { external_id } => show_payment(cfg, &external_id),
        PaymentCommands::Status { external_id } => {
            let gateway = PublicApiClient::from_config(cfg)?;
            let finder = PaymentFinder::new(Database::from_config(cfg), links(cfg));
            match finder
                .fetch_from_gateway(&gateway, &external_id)
                .await
                .or_else(fail)?
            {
                Some(response) => print_json(&response),
                None => not_found("payment", &external_id),
            }
        }
    }
}

/// Create a payment through the payments API
async fn pay(cfg: &ResolvedConfig, product_id: i64) -> Result<()> {
    let gateway = PublicApiClient::from_config(cfg)?;
    let creator = PaymentCreator::new(
        Database::from_config(cfg),
        Arc::new(gateway),
        Arc::new(RandomIdGenerator),
        links(cfg),
    );

    let payment = creator.create(product_id).await.or_else(fail)?;
    print_json(&payment)
}

fn show_payment(cfg: &ResolvedConfig, external_id: &str) -> Result<()> {
    let finder = PaymentFinder::new(Database::from_config(cfg), links(cfg));
    match finder.find_by_external_id(external_id).or_else(fail)? {
        Some(payment) => print_json(&payment),
        None => not_found("payment", external_id),
    }
}

fn health(cfg: &ResolvedConfig) -> Result<()> {
    let database = Database::from_config(cfg);
    match database.health_check() {
        Ok(()) => print_json(&serde_json::json!({ "database": { "healthy": true } })),
        Err(e) => {
            print_json(&serde_json::json!({
                "database": { "healthy": false, "message": e.to_string() }
            }))?;
            std::process::exit(1);
        }
    }
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database_path.display());
    println!();
    println!("Public API:");
    println!("  URL:     {}", cfg.public_api.url);
    println!("  Timeout: {}s", cfg.public_api.timeout_seconds);
    println!();
    println!("Links:");
    println!("  Products API: {}", cfg.links.products_api_url);
    println!("  Pay UI:       {}", cfg.links.products_ui_pay_url);

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Report a service failure with its HTTP status and exit
fn fail<T>(error: ServiceError) -> Result<T> {
    eprintln!("[{}] {}", error.http_status(), error);
    std::process::exit(1);
}

fn not_found(entity: &str, id: &str) -> Result<()> {
    eprintln!("[404] {} {} not found", entity, id);
    std::process::exit(1);
}
