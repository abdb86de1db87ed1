use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    models::{
        attributes::text,
        item::{REQUIRED_ATTRIBUTES, ROW_ID},
        Adjustment, Attributes, HasAttributes, Item, ItemError,
    },
    session::{SessionStore, SessionStoreError},
    utils::config::CartConfig,
};

#[derive(Error, Debug)]
pub enum CartError {
    #[error("Item already exists: {row_id}")]
    DuplicateItem { row_id: String },

    #[error("Item not found: {row_id}")]
    ItemNotFound { row_id: String },

    #[error("Invalid cart input: {reason}")]
    InvalidInput { reason: String },

    #[error("Item error: {0}")]
    Item(#[from] ItemError),

    #[error("Session error: {0}")]
    Session(#[from] SessionStoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// What `Cart::add` and `Cart::update` accept.
#[derive(Debug, Clone)]
pub enum ItemInput {
    /// Raw attributes, e.g. `{"name": "Widget", "price": 10, "qty": 1}`.
    Record(Attributes),
    Item(Item),
    Batch(Vec<ItemInput>),
    /// A JSON value that is neither a record nor a list of them.
    Malformed(Value),
}

impl ItemInput {
    fn into_leaves(self) -> Vec<ItemInput> {
        match self {
            ItemInput::Batch(inputs) => inputs.into_iter().flat_map(ItemInput::into_leaves).collect(),
            leaf => vec![leaf],
        }
    }
}

impl From<Attributes> for ItemInput {
    fn from(attributes: Attributes) -> Self {
        ItemInput::Record(attributes)
    }
}

impl From<Item> for ItemInput {
    fn from(item: Item) -> Self {
        ItemInput::Item(item)
    }
}

impl<T: Into<ItemInput>> From<Vec<T>> for ItemInput {
    fn from(inputs: Vec<T>) -> Self {
        ItemInput::Batch(inputs.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for ItemInput {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(attributes) => ItemInput::Record(attributes),
            Value::Array(values) => ItemInput::Batch(values.into_iter().map(ItemInput::from).collect()),
            other => ItemInput::Malformed(other),
        }
    }
}

/// What `Cart::remove` accepts: anything that resolves to one or more row ids.
#[derive(Debug, Clone)]
pub enum RemoveTarget {
    RowId(String),
    Record(Attributes),
    Batch(Vec<RemoveTarget>),
    Malformed(Value),
}

impl RemoveTarget {
    fn into_leaves(self) -> Vec<RemoveTarget> {
        match self {
            RemoveTarget::Batch(targets) => targets
                .into_iter()
                .flat_map(RemoveTarget::into_leaves)
                .collect(),
            leaf => vec![leaf],
        }
    }
}

impl From<&str> for RemoveTarget {
    fn from(row_id: &str) -> Self {
        RemoveTarget::RowId(row_id.to_string())
    }
}

impl From<String> for RemoveTarget {
    fn from(row_id: String) -> Self {
        RemoveTarget::RowId(row_id)
    }
}

impl From<&String> for RemoveTarget {
    fn from(row_id: &String) -> Self {
        RemoveTarget::RowId(row_id.clone())
    }
}

impl From<&Item> for RemoveTarget {
    fn from(item: &Item) -> Self {
        RemoveTarget::RowId(item.row_id().unwrap_or_default().to_string())
    }
}

impl From<Item> for RemoveTarget {
    fn from(item: Item) -> Self {
        RemoveTarget::from(&item)
    }
}

impl From<Attributes> for RemoveTarget {
    fn from(attributes: Attributes) -> Self {
        RemoveTarget::Record(attributes)
    }
}

impl<T: Into<RemoveTarget>> From<Vec<T>> for RemoveTarget {
    fn from(targets: Vec<T>) -> Self {
        RemoveTarget::Batch(targets.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for RemoveTarget {
    fn from(value: Value) -> Self {
        match value {
            Value::String(row_id) => RemoveTarget::RowId(row_id),
            Value::Number(number) => RemoveTarget::RowId(number.to_string()),
            Value::Object(attributes) => RemoveTarget::Record(attributes),
            Value::Array(values) => {
                RemoveTarget::Batch(values.into_iter().map(RemoveTarget::from).collect())
            }
            other => RemoveTarget::Malformed(other),
        }
    }
}

/// A shopping cart kept in a session.
///
/// The cart is built once per request from whatever snapshot the session holds under the
/// configured key. Mutations change the in-memory items; with auto-save on, each applied
/// item is written back to the session immediately, otherwise nothing is written until
/// `save` is called.
pub struct Cart {
    session: Arc<dyn SessionStore>,
    session_key: String,
    items: IndexMap<String, Item>,
    discount: Option<Adjustment>,
    tax: Option<Adjustment>,
    auto_save: bool,
}

impl Cart {
    pub async fn new(session: Arc<dyn SessionStore>, config: &CartConfig) -> Result<Self, CartError> {
        let mut cart = Self {
            session,
            session_key: config.session_key.clone(),
            items: IndexMap::new(),
            discount: None,
            tax: None,
            auto_save: false,
        };

        if let Some(snapshot) = cart.session.get(&cart.session_key).await? {
            cart.set_items(snapshot)?;
            debug!(
                "Restored {} items from session key '{}'",
                cart.items.len(),
                cart.session_key
            );
        }

        // Enabled only after hydration so restoring never writes back.
        cart.set_auto_save(config.auto_save);
        Ok(cart)
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Add one item, a list of items, or raw attribute records.
    pub async fn add(&mut self, input: impl Into<ItemInput>) -> Result<&mut Self, CartError> {
        for input in input.into().into_leaves() {
            self.add_one(input)?;
            self.auto_save().await?;
        }

        Ok(self)
    }

    /// Merge attributes into existing items, or replace them with the given items.
    pub async fn update(&mut self, input: impl Into<ItemInput>) -> Result<&mut Self, CartError> {
        for input in input.into().into_leaves() {
            self.update_one(input)?;
            self.auto_save().await?;
        }

        Ok(self)
    }

    pub async fn remove(&mut self, target: impl Into<RemoveTarget>) -> Result<&mut Self, CartError> {
        for target in target.into().into_leaves() {
            self.remove_one(target)?;
            self.auto_save().await?;
        }

        Ok(self)
    }

    pub fn items(&self) -> &IndexMap<String, Item> {
        &self.items
    }

    pub fn item(&self, row_id: &str) -> Option<&Item> {
        self.items.get(row_id)
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Write the current items to the session.
    pub async fn save(&self) -> Result<(), CartError> {
        self.session.put(&self.session_key, self.snapshot()).await?;
        debug!(
            "Saved {} items under session key '{}'",
            self.items.len(),
            self.session_key
        );
        Ok(())
    }

    /// Forget the persisted cart. The in-memory items are left untouched, so a later
    /// `save` writes them back.
    pub async fn destroy(&mut self) -> Result<&mut Self, CartError> {
        self.session.forget(&self.session_key).await?;
        info!("Destroyed cart session '{}'", self.session_key);
        Ok(self)
    }

    pub fn set_auto_save(&mut self, auto_save: bool) -> &mut Self {
        self.auto_save = auto_save;
        self
    }

    pub fn is_auto_save(&self) -> bool {
        self.auto_save
    }

    pub fn set_discount(&mut self, discount: impl Into<Option<Adjustment>>) -> &mut Self {
        self.discount = discount.into();
        self
    }

    pub fn discount(&self) -> Option<Adjustment> {
        self.discount
    }

    pub fn set_tax(&mut self, tax: impl Into<Option<Adjustment>>) -> &mut Self {
        self.tax = tax.into();
        self
    }

    pub fn tax(&self) -> Option<Adjustment> {
        self.tax
    }

    /// Sum of every item's own line price.
    pub fn total_price(&self) -> f64 {
        self.items.values().map(Item::calculate_price).sum()
    }

    /// `total_price` less the cart discount, plus the cart tax.
    pub fn total(&self) -> f64 {
        let mut total = self.total_price();

        if let Some(discount) = &self.discount {
            total -= self.calculate_percentual_or_fixed(discount);
        }

        if let Some(tax) = &self.tax {
            total += self.calculate_percentual_or_fixed(tax);
        }

        total
    }

    /// Percentages are taken of `total_price`.
    pub fn calculate_percentual_or_fixed(&self, value: &Adjustment) -> f64 {
        value.resolve(self.total_price())
    }

    pub fn total_qty(&self) -> f64 {
        self.items.values().map(Item::qty).sum()
    }

    /// The value `save` writes: row id to item attributes, options nested by name.
    pub fn snapshot(&self) -> Value {
        let rows: Map<String, Value> = self
            .items
            .iter()
            .map(|(row_id, item)| (row_id.clone(), item.to_value()))
            .collect();
        Value::Object(rows)
    }

    pub fn to_json(&self) -> String {
        self.snapshot().to_string()
    }

    pub fn to_json_pretty(&self) -> Result<String, CartError> {
        Ok(serde_json::to_string_pretty(&self.items)?)
    }

    // Private helper methods

    fn add_one(&mut self, input: ItemInput) -> Result<(), CartError> {
        match input {
            ItemInput::Record(mut attributes) => {
                let row_id = match attributes.get(ROW_ID).and_then(text) {
                    Some(row_id) if self.items.contains_key(&row_id) => {
                        return Err(CartError::DuplicateItem { row_id })
                    }
                    Some(row_id) => row_id,
                    None => self.create_row_id(),
                };
                attributes.insert(ROW_ID.to_string(), Value::String(row_id.clone()));

                let mut item = Item::new();
                item.bind(&self.session_key);
                item.fill(attributes)?;

                debug!("Adding item {} to cart '{}'", row_id, self.session_key);
                self.items.insert(row_id, item);
            }
            ItemInput::Item(mut item) => {
                let row_id = match item.row_id() {
                    Some(row_id) => row_id.to_string(),
                    None => {
                        let row_id = self.create_row_id();
                        item.set(ROW_ID, Value::String(row_id.clone()))?;
                        row_id
                    }
                };

                if self.items.contains_key(&row_id) {
                    return Err(CartError::DuplicateItem { row_id });
                }

                item.bind(&self.session_key);
                debug!("Adding item {} to cart '{}'", row_id, self.session_key);
                self.items.insert(row_id, item);
            }
            ItemInput::Batch(inputs) => {
                for input in inputs {
                    self.add_one(input)?;
                }
            }
            ItemInput::Malformed(value) => {
                return Err(CartError::InvalidInput {
                    reason: format!("expected an item or attribute record, got {}", value),
                })
            }
        }

        Ok(())
    }

    fn update_one(&mut self, input: ItemInput) -> Result<(), CartError> {
        match input {
            ItemInput::Record(attributes) => {
                let row_id = attributes.get(ROW_ID).and_then(text).unwrap_or_default();
                let item = self
                    .items
                    .get_mut(&row_id)
                    .ok_or_else(|| CartError::ItemNotFound {
                        row_id: row_id.clone(),
                    })?;

                // Fill a copy so a failing attribute leaves the stored item as it was.
                let mut updated = item.clone();
                updated.fill(attributes)?;
                *item = updated;

                debug!("Updated item {} in cart '{}'", row_id, self.session_key);
            }
            ItemInput::Item(mut item) => {
                let row_id = item.row_id().unwrap_or_default().to_string();
                if !self.items.contains_key(&row_id) {
                    return Err(CartError::ItemNotFound { row_id });
                }

                item.bind(&self.session_key);
                debug!("Replaced item {} in cart '{}'", row_id, self.session_key);
                self.items.insert(row_id, item);
            }
            ItemInput::Batch(inputs) => {
                for input in inputs {
                    self.update_one(input)?;
                }
            }
            ItemInput::Malformed(value) => {
                return Err(CartError::InvalidInput {
                    reason: format!("expected an item or attribute record, got {}", value),
                })
            }
        }

        Ok(())
    }

    fn remove_one(&mut self, target: RemoveTarget) -> Result<(), CartError> {
        let row_id = match target {
            RemoveTarget::RowId(row_id) => row_id,
            RemoveTarget::Record(attributes) => {
                attributes.get(ROW_ID).and_then(text).unwrap_or_default()
            }
            RemoveTarget::Batch(targets) => {
                for target in targets {
                    self.remove_one(target)?;
                }
                return Ok(());
            }
            RemoveTarget::Malformed(value) => {
                return Err(CartError::InvalidInput {
                    reason: format!("expected a row id, item or attribute record, got {}", value),
                })
            }
        };

        if self.items.shift_remove(&row_id).is_none() {
            return Err(CartError::ItemNotFound { row_id });
        }

        debug!("Removed item {} from cart '{}'", row_id, self.session_key);
        Ok(())
    }

    fn set_items(&mut self, snapshot: Value) -> Result<(), CartError> {
        match snapshot {
            Value::Object(rows) => {
                for (row_id, attributes) in rows {
                    self.restore(Some(row_id), attributes)?;
                }
            }
            Value::Array(rows) => {
                for attributes in rows {
                    self.restore(None, attributes)?;
                }
            }
            Value::Null => {}
            other => warn!(
                "Ignoring session value under '{}': expected an object of items, got {}",
                self.session_key, other
            ),
        }

        Ok(())
    }

    fn restore(&mut self, row_id: Option<String>, attributes: Value) -> Result<(), CartError> {
        let attributes = match attributes {
            Value::Object(attributes) => attributes,
            other => {
                warn!(
                    "Skipping stored item {:?} in '{}': expected attributes, got {}",
                    row_id, self.session_key, other
                );
                return Ok(());
            }
        };

        let mut item = Item::new();
        item.bind(&self.session_key);
        item.fill(attributes)?;

        // A non-empty mapping key is authoritative for the row id.
        let row_id = match row_id
            .filter(|row_id| !row_id.is_empty())
            .or_else(|| item.row_id().map(str::to_string))
        {
            Some(row_id) => row_id,
            None => self.create_row_id(),
        };
        item.set(ROW_ID, Value::String(row_id.clone()))?;

        let missing: Vec<&str> = REQUIRED_ATTRIBUTES
            .iter()
            .copied()
            .filter(|key| !item.has(key))
            .collect();
        if !missing.is_empty() {
            debug!("Restored item {} is missing {:?}", row_id, missing);
        }

        if self.items.contains_key(&row_id) {
            return Err(CartError::DuplicateItem { row_id });
        }

        self.items.insert(row_id, item);
        Ok(())
    }

    fn create_row_id(&self) -> String {
        loop {
            let row_id = Uuid::new_v4().simple().to_string();
            if !self.items.contains_key(&row_id) {
                return row_id;
            }
        }
    }

    async fn auto_save(&self) -> Result<(), CartError> {
        if self.is_auto_save() {
            self.save().await?;
        }
        Ok(())
    }
}

impl fmt::Debug for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("session_key", &self.session_key)
            .field("items", &self.items)
            .field("discount", &self.discount)
            .field("tax", &self.tax)
            .field("auto_save", &self.auto_save)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.snapshot())
    }
}
