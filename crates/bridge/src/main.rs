//! Storefront Bridge
//!
//! Runs storefront actions against the configured commerce platform and
//! prints the JSON response body.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use storefront_bridge::backend::{Backends, CachedSchemaClient, HttpCommerceClient};
use storefront_bridge::config::Config;
use storefront_bridge::{ActionRequest, ProductActions};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "storefront-bridge", about = "Query the product catalog")]
struct Cli {
    /// Storefront locale (e.g. `en_US`, `de_DE@EUR`).
    #[arg(long, global = true, default_value = "en_US")]
    locale: String,

    /// Currency override.
    #[arg(long, global = true)]
    currency: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search products.
    Query {
        /// Free-text search.
        #[arg(long)]
        text: Option<String>,
        /// Category ID (repeatable).
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Category slug to scope the search to.
        #[arg(long)]
        category_slug: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
        /// Extra parameters as a JSON object (filters, facets, sortAttributes).
        #[arg(long)]
        params: Option<String>,
    },
    /// Fetch one product by ID or SKU.
    Product {
        #[arg(long, conflicts_with = "sku", required_unless_present = "sku")]
        id: Option<String>,
        #[arg(long)]
        sku: Option<String>,
    },
    /// Show the stock level of a SKU.
    Inventory {
        #[arg(long)]
        sku: String,
    },
    /// List categories.
    Categories {
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        parent_id: Option<String>,
        /// Build the category tree.
        #[arg(long)]
        tree: bool,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
    },
    /// List searchable attributes.
    Attributes,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(project = %config.project_key, "Configuration loaded");

    let client = Arc::new(
        HttpCommerceClient::new(config.client_config()).context("failed to create client")?,
    );
    let mut backends = Backends::from_client(client.clone());
    if !config.schema_cache_ttl.is_zero() {
        info!(ttl_secs = config.schema_cache_ttl.as_secs(), "Schema cache enabled");
        backends = backends.with_schemas(Arc::new(CachedSchemaClient::new(
            client,
            config.schema_cache_ttl,
        )));
    }

    let actions = ProductActions::new(backends, config.query_settings(), &config.default_currency);

    let mut request = ActionRequest::default().with_query("locale", Value::from(cli.locale));
    if let Some(currency) = cli.currency {
        request = request.with_query("currency", Value::from(currency));
    }

    let response = match cli.command {
        Command::Query {
            text,
            categories,
            category_slug,
            limit,
            cursor,
            params,
        } => {
            let mut query = match params {
                Some(raw) => serde_json::from_str::<Map<String, Value>>(&raw)
                    .context("--params must be a JSON object")?,
                None => Map::new(),
            };
            query.extend(request.query);
            request.query = query;

            request = with_optional(request, "query", text);
            request = with_optional(request, "categorySlug", category_slug);
            request = with_optional(request, "limit", limit);
            request = with_optional(request, "cursor", cursor);
            if !categories.is_empty() {
                request = request.with_query("categories", Value::from(categories));
            }
            actions.query(&request).await
        }
        Command::Product { id, sku } => {
            request = with_optional(request, "id", id);
            request = with_optional(request, "sku", sku);
            actions.get_product(&request).await
        }
        Command::Inventory { sku } => {
            request = request.with_query("sku", Value::from(sku));
            actions.get_inventory(&request).await
        }
        Command::Categories {
            slug,
            parent_id,
            tree,
            limit,
            cursor,
        } => {
            request = with_optional(request, "slug", slug);
            request = with_optional(request, "parentId", parent_id);
            request = with_optional(request, "limit", limit);
            request = with_optional(request, "cursor", cursor);
            if tree {
                request = request.with_query("format", Value::from("tree"));
            }
            actions.query_categories(&request).await
        }
        Command::Attributes => actions.searchable_attributes(&request).await,
    };

    info!(status = response.status_code, "Action finished");
    println!("{}", response.body);

    if response.status_code >= 400 {
        std::process::exit(1);
    }

    Ok(())
}

fn with_optional<T: Into<Value>>(
    request: ActionRequest,
    name: &str,
    value: Option<T>,
) -> ActionRequest {
    match value {
        Some(value) => request.with_query(name, value.into()),
        None => request,
    }
}

/// Initialize tracing with env filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
