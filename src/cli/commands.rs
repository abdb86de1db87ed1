use anyhow::{Context, Result};
use console::{style, Emoji};
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{error, info};

use crate::{
    cli::args::Commands,
    models::{item::ROW_ID, Adjustment},
    services::{Cart, CartError},
    session::FileSessionStore,
    utils::{
        config::CartConfig,
        formatting::{format_item_detail, format_item_table, format_totals},
    },
};

static CHECKMARK: Emoji<'_, '_> = Emoji("✅ ", "");
static CROSS: Emoji<'_, '_> = Emoji("❌ ", "");
static INFO: Emoji<'_, '_> = Emoji("ℹ️ ", "");
static CART: Emoji<'_, '_> = Emoji("🛒 ", "");

pub struct CliApp {
    cart: Cart,
}

impl CliApp {
    pub async fn new(config: &CartConfig) -> Result<Self> {
        let store = Arc::new(FileSessionStore::new(config.session_file.clone()));
        info!("Using session file {}", store.path().display());

        let cart = Cart::new(store, config)
            .await
            .context("Failed to load cart from session")?;

        Ok(Self { cart })
    }

    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Add {
                name,
                price,
                qty,
                row_id,
                discount,
                tax,
                options,
            } => {
                self.handle_add(name, price, qty, row_id, discount, tax, options)
                    .await
            }
            Commands::Update {
                row_id,
                name,
                price,
                qty,
                discount,
                tax,
                options,
            } => {
                self.handle_update(row_id, name, price, qty, discount, tax, options)
                    .await
            }
            Commands::Remove { row_ids } => self.handle_remove(row_ids).await,
            Commands::List => self.handle_list(),
            Commands::Show { row_id } => self.handle_show(&row_id),
            Commands::Total { discount, tax } => self.handle_total(discount, tax),
            Commands::Export { pretty } => self.handle_export(pretty),
            Commands::Destroy { force } => self.handle_destroy(force).await,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_add(
        &mut self,
        name: String,
        price: f64,
        qty: f64,
        row_id: Option<String>,
        discount: Option<String>,
        tax: Option<String>,
        options: Vec<String>,
    ) -> Result<()> {
        let mut record = Map::new();
        if let Some(row_id) = row_id {
            record.insert(ROW_ID.to_string(), Value::String(row_id));
        }
        record.insert("name".to_string(), Value::String(name));
        record.insert("price".to_string(), json!(price));
        record.insert("qty".to_string(), json!(qty));
        insert_adjustments(&mut record, discount, tax)?;
        if !options.is_empty() {
            record.insert("options".to_string(), parse_options(&options)?);
        }

        let before: Vec<String> = self.cart.items().keys().cloned().collect();
        let result = self.cart.add(record).await.map(|_| ());
        match result {
            Ok(_) => {
                self.persist().await?;
                let added = self
                    .cart
                    .items()
                    .iter()
                    .find(|(row_id, _)| !before.contains(row_id));
                println!("{} Item added to cart!", CHECKMARK);
                if let Some((_, item)) = added {
                    println!("{}", format_item_detail(item));
                    info!("Item added: {:?}", item.row_id());
                }
            }
            Err(e) => report("add item", &e),
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn handle_update(
        &mut self,
        row_id: String,
        name: Option<String>,
        price: Option<f64>,
        qty: Option<f64>,
        discount: Option<String>,
        tax: Option<String>,
        options: Vec<String>,
    ) -> Result<()> {
        let mut record = Map::new();
        record.insert(ROW_ID.to_string(), Value::String(row_id.clone()));
        if let Some(name) = name {
            record.insert("name".to_string(), Value::String(name));
        }
        if let Some(price) = price {
            record.insert("price".to_string(), json!(price));
        }
        if let Some(qty) = qty {
            record.insert("qty".to_string(), json!(qty));
        }
        insert_adjustments(&mut record, discount, tax)?;
        if !options.is_empty() {
            record.insert("options".to_string(), parse_options(&options)?);
        }

        let result = self.cart.update(record).await.map(|_| ());
        match result {
            Ok(_) => {
                self.persist().await?;
                println!("{} Item updated successfully!", CHECKMARK);
                if let Some(item) = self.cart.item(&row_id) {
                    println!("{}", format_item_detail(item));
                }
                info!("Item updated: {}", row_id);
            }
            Err(e) => report("update item", &e),
        }

        Ok(())
    }

    async fn handle_remove(&mut self, row_ids: Vec<String>) -> Result<()> {
        let count = row_ids.len();
        let result = self.cart.remove(row_ids).await.map(|_| ());
        match result {
            Ok(_) => {
                self.persist().await?;
                println!("{} Removed {} item(s) from cart", CHECKMARK, count);
                info!("Removed {} items", count);
            }
            Err(e) => {
                // Items removed before the failure stay removed.
                self.persist().await?;
                report("remove item", &e);
            }
        }

        Ok(())
    }

    fn handle_list(&self) -> Result<()> {
        if !self.cart.has_items() {
            println!("{} Your cart is empty", INFO);
            return Ok(());
        }

        println!(
            "{} {}",
            CART,
            style(format!("{} line item(s)", self.cart.items().len())).bold()
        );
        println!("{}", format_item_table(&self.cart));
        println!("{}", format_totals(&self.cart));
        Ok(())
    }

    fn handle_show(&self, row_id: &str) -> Result<()> {
        match self.cart.item(row_id) {
            Some(item) => {
                println!("{} {}", INFO, style("Item Details").bold().cyan());
                println!("{}", format_item_detail(item));
            }
            None => report(
                "show item",
                &CartError::ItemNotFound {
                    row_id: row_id.to_string(),
                },
            ),
        }

        Ok(())
    }

    fn handle_total(&mut self, discount: Option<String>, tax: Option<String>) -> Result<()> {
        let discount = parse_adjustment("discount", discount)?;
        let tax = parse_adjustment("tax", tax)?;
        self.cart.set_discount(discount).set_tax(tax);

        println!("{} {}", CART, style("Cart Totals").bold().cyan());
        println!("{}", format_totals(&self.cart));
        Ok(())
    }

    fn handle_export(&self, pretty: bool) -> Result<()> {
        let json = if pretty {
            self.cart.to_json_pretty()?
        } else {
            self.cart.to_json()
        };
        println!("{}", json);
        Ok(())
    }

    async fn handle_destroy(&mut self, force: bool) -> Result<()> {
        // Confirm unless force flag is used
        if !force {
            let theme = ColorfulTheme::default();
            let confirm = Confirm::with_theme(&theme)
                .with_prompt("Are you sure you want to empty the cart?")
                .default(false)
                .interact()?;

            if !confirm {
                println!("Cart destruction cancelled");
                return Ok(());
            }
        }

        let result = self.cart.destroy().await.map(|_| ());
        match result {
            Ok(_) => {
                println!("{} Cart removed from session", CHECKMARK);
                info!("Cart '{}' destroyed", self.cart.session_key());
            }
            Err(e) => report("destroy cart", &e),
        }

        Ok(())
    }

    /// Each command runs in its own process, so without auto-save the cart is written
    /// explicitly after a mutation.
    async fn persist(&self) -> Result<()> {
        if !self.cart.is_auto_save() {
            self.cart.save().await.context("Failed to save cart")?;
        }
        Ok(())
    }
}

fn report(action: &str, e: &CartError) {
    println!("{} Failed to {}: {}", CROSS, action, style(e).red());
    error!("Failed to {}: {}", action, e);
}

fn parse_adjustment(label: &str, value: Option<String>) -> Result<Option<Adjustment>> {
    value
        .map(|text| {
            text.parse::<Adjustment>()
                .with_context(|| format!("Invalid {}. Use an amount (\"5\") or a percentage (\"10%\")", label))
        })
        .transpose()
}

fn insert_adjustments(
    record: &mut Map<String, Value>,
    discount: Option<String>,
    tax: Option<String>,
) -> Result<()> {
    if let Some(discount) = parse_adjustment("discount", discount)? {
        record.insert("discount".to_string(), discount.to_value());
    }
    if let Some(tax) = parse_adjustment("tax", tax)? {
        record.insert("tax".to_string(), tax.to_value());
    }
    Ok(())
}

/// Turn `NAME=VALUE` pairs into option records.
fn parse_options(options: &[String]) -> Result<Value> {
    let records = options
        .iter()
        .map(|option| {
            let (name, value) = option
                .split_once('=')
                .with_context(|| format!("Invalid option '{}'. Use NAME=VALUE", option))?;
            Ok(json!({"name": name.trim(), "value": value.trim()}))
        })
        .collect::<Result<Vec<Value>>>()?;

    Ok(Value::Array(records))
}
