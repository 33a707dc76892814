//! Cart commands.
//!
//! Each invocation loads the persisted cart, applies one operation, waits
//! for the remote sync to settle and prints the result. Without a token
//! (`REPARTO_TOKEN` or `token:` in the config) the cart stays local.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;

use reparto::cart::{JsonFileStorage, RemovedLine};
use reparto::{ApiClient, AppConfig, CartItem, CartState, CartStore};

use super::common::{Output, print_json};

#[derive(Subcommand)]
pub enum CartCommand {
    /// Print the cart
    Show,
    /// Add units of a product (merged with an existing line)
    Add {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity; zero or less removes it
    Update {
        id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove { id: String },
    /// Empty the cart
    Clear,
    /// Replace the cart with the server's copy
    Refresh,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonCart<'a> {
    items: &'a [CartItem],
    total: f64,
    item_count: u32,
    warnings: &'a [String],
    removed_items: &'a [RemovedLine],
}

pub async fn run(command: CartCommand, config_path: Option<&Path>, output: Output) -> Result<()> {
    let config = AppConfig::load(config_path).context("loading configuration")?;

    let client = ApiClient::new(config.services.clone())?;
    if let Some(token) = &config.token {
        client.session().set_token(token.clone());
    }

    let storage = JsonFileStorage::new(config.cart_storage_path());
    tracing::debug!(path = %storage.path().display(), "cart storage");
    let store = CartStore::new(Arc::new(client.cart()), storage, config.debounce());

    match command {
        CartCommand::Show => {}
        CartCommand::Add {
            id,
            name,
            price,
            quantity,
        } => store.add_item(CartItem::new(id, name, price, quantity)),
        CartCommand::Update { id, quantity } => store.update_quantity(&id, quantity),
        CartCommand::Remove { id } => store.remove_item(&id),
        CartCommand::Clear => store.clear_cart(),
        CartCommand::Refresh => store.refresh_cart().await,
    }
    store.shutdown().await;

    print_cart(&store.state(), output)
}

fn print_cart(state: &CartState, output: Output) -> Result<()> {
    if output.json {
        return print_json(&JsonCart {
            items: &state.items,
            total: state.total(),
            item_count: state.item_count(),
            warnings: &state.warnings,
            removed_items: &state.removed_items,
        });
    }

    if state.items.is_empty() {
        println!("cart is empty");
    }
    for item in &state.items {
        println!(
            "{:<12} {:<24} {:>4} x {:>10.2} = {:>10.2}",
            item.id,
            item.name,
            item.quantity,
            item.unit_price,
            item.subtotal()
        );
    }
    if !state.items.is_empty() {
        println!("total: {:.2} ({} units)", state.total(), state.item_count());
    }
    for warning in &state.warnings {
        println!("warning: {}", warning);
    }
    for line in &state.removed_items {
        match &line.reason {
            Some(reason) => println!("removed: {} ({})", line.name, reason),
            None => println!("removed: {}", line.name),
        }
    }
    Ok(())
}
