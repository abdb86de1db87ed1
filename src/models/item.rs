use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;
use validator::{Validate, ValidationErrors};

use crate::models::adjustment::Adjustment;
use crate::models::attributes::{numeric, text, Accessor, Attributes, HasAttributes, Mutator};
use crate::models::option::CartOption;

pub const ROW_ID: &str = "rowId";
pub const OPTIONS: &str = "options";

/// Attributes every line item is expected to carry.
pub const REQUIRED_ATTRIBUTES: [&str; 4] = ["name", "qty", "price", ROW_ID];

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("Attribute not found: {key}")]
    AttributeNotFound { key: String },

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Invalid options: {reason}")]
    InvalidOptions { reason: String },
}

/// One line in a cart.
///
/// Everything except the options lives in an open attribute map, so callers can attach
/// arbitrary fields (`sku`, `image`, ...) next to the ones the cart reads (`name`, `qty`,
/// `price`, `rowId`, `discount`, `tax`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    cart: Option<String>,
    attributes: Attributes,
    options: IndexMap<String, CartOption>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attributes(attributes: Attributes) -> Result<Self, ItemError> {
        let mut item = Self::new();
        item.fill(attributes)?;
        Ok(item)
    }

    /// Session key of the cart holding this item, if any.
    pub fn cart(&self) -> Option<&str> {
        self.cart.as_deref()
    }

    pub(crate) fn bind(&mut self, cart: &str) {
        self.cart = Some(cart.to_string());
    }

    pub fn row_id(&self) -> Option<&str> {
        self.attributes
            .get(ROW_ID)
            .and_then(Value::as_str)
            .filter(|row_id| !row_id.is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    pub fn qty(&self) -> f64 {
        self.number("qty")
    }

    pub fn price(&self) -> f64 {
        self.number("price")
    }

    pub fn discount(&self) -> Option<Adjustment> {
        self.adjustment("discount")
    }

    pub fn tax(&self) -> Option<Adjustment> {
        self.adjustment("tax")
    }

    pub fn options(&self) -> &IndexMap<String, CartOption> {
        &self.options
    }

    pub fn option(&self, name: &str) -> Option<&CartOption> {
        self.options.get(name)
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    /// Add options from a list of option records, or from a `name -> record` object as
    /// written by `to_value`.
    pub fn set_options(&mut self, options: Value) -> Result<(), ItemError> {
        match options {
            Value::Array(records) => records
                .into_iter()
                .try_for_each(|record| self.set_option(record)),
            Value::Object(records) => records
                .into_iter()
                .try_for_each(|(_, record)| self.set_option(record)),
            Value::Null => Ok(()),
            other => Err(ItemError::InvalidOptions {
                reason: format!("expected a list of options, got {}", other),
            }),
        }
    }

    pub fn set_option(&mut self, record: Value) -> Result<(), ItemError> {
        let attributes = match record {
            Value::Object(attributes) => attributes,
            other => {
                return Err(ItemError::InvalidOptions {
                    reason: format!("expected an option record, got {}", other),
                })
            }
        };

        let option = CartOption::from_attributes(attributes)?;
        let name = option.name().ok_or_else(|| ItemError::AttributeNotFound {
            key: "name".to_string(),
        })?;

        self.options.insert(name, option);
        Ok(())
    }

    /// `price * qty`, less the item discount, plus the item tax.
    pub fn calculate_price(&self) -> f64 {
        let mut total = self.price() * self.qty();

        if let Some(discount) = self.discount() {
            total -= self.calculate_percentual_or_fixed(&discount);
        }

        if let Some(tax) = self.tax() {
            total += self.calculate_percentual_or_fixed(&tax);
        }

        total
    }

    /// Percentages are taken of the unit price.
    pub fn calculate_percentual_or_fixed(&self, value: &Adjustment) -> f64 {
        value.resolve(self.price())
    }

    pub fn to_value(&self) -> Value {
        let mut attributes = self.attributes.clone();
        attributes.insert(OPTIONS.to_string(), self.options_value());
        Value::Object(attributes)
    }

    fn options_value(&self) -> Value {
        let options: Map<String, Value> = self
            .options
            .iter()
            .map(|(name, option)| (name.clone(), option.to_value()))
            .collect();
        Value::Object(options)
    }

    fn store_row_id(&mut self, row_id: Value) -> Result<(), ItemError> {
        // Numeric ids are kept as strings so they match the cart's keys.
        let row_id = text(&row_id).map(Value::String).unwrap_or(Value::Null);
        self.attributes.insert(ROW_ID.to_string(), row_id);
        Ok(())
    }

    fn number(&self, key: &str) -> f64 {
        self.attributes.get(key).and_then(numeric).unwrap_or(0.0)
    }

    fn adjustment(&self, key: &str) -> Option<Adjustment> {
        let value = self.attributes.get(key)?;
        match Adjustment::from_value(value) {
            Ok(adjustment) => adjustment,
            Err(e) => {
                warn!("Ignoring {} on item {:?}: {}", key, self.row_id(), e);
                None
            }
        }
    }
}

impl HasAttributes for Item {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn mutator(key: &str) -> Option<Mutator<Self>> {
        match key {
            OPTIONS => Some(Item::set_options),
            "option" => Some(Item::set_option),
            ROW_ID => Some(Item::store_row_id),
            _ => None,
        }
    }

    fn accessor(key: &str) -> Option<Accessor<Self>> {
        match key {
            OPTIONS => Some(Item::options_value),
            _ => None,
        }
    }
}

impl Validate for Item {
    fn validate(&self) -> Result<(), ValidationErrors> {
        // TODO: reject items missing REQUIRED_ATTRIBUTES once partial updates are
        // validated against the merged record instead of the incoming one.
        Ok(())
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(value: Value) -> Attributes {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn widget() -> Item {
        Item::from_attributes(attributes(json!({
            "rowId": "row-1",
            "name": "Widget",
            "price": 10,
            "qty": 3,
        })))
        .unwrap()
    }

    #[test]
    fn test_fill_and_typed_readers() {
        let item = widget();

        assert_eq!(item.row_id(), Some("row-1"));
        assert_eq!(item.name(), Some("Widget"));
        assert_eq!(item.qty(), 3.0);
        assert_eq!(item.price(), 10.0);
        assert_eq!(item.cart(), None);
        assert!(!item.has_options());
    }

    #[test]
    fn test_calculate_price_plain() {
        assert_eq!(widget().calculate_price(), 30.0);
    }

    #[test]
    fn test_calculate_price_with_fixed_discount_and_percent_tax() {
        let mut item = widget();
        item.set("discount", json!(4)).unwrap();
        item.set("tax", json!("10%")).unwrap();

        // 30 - 4 + 10% of the unit price (10)
        assert_eq!(item.calculate_price(), 27.0);
    }

    #[test]
    fn test_percent_discount_uses_unit_price() {
        let mut item = widget();
        item.set("discount", json!("50%")).unwrap();

        assert_eq!(item.calculate_price(), 25.0);
    }

    #[test]
    fn test_invalid_adjustment_is_ignored() {
        let mut item = widget();
        item.set("discount", json!("lots")).unwrap();

        assert_eq!(item.calculate_price(), 30.0);
    }

    #[test]
    fn test_string_numbers_are_accepted() {
        let item = Item::from_attributes(attributes(json!({
            "name": "Gadget",
            "price": "2.5",
            "qty": "4",
        })))
        .unwrap();

        assert_eq!(item.calculate_price(), 10.0);
    }

    #[test]
    fn test_options_route_through_mutator() {
        let mut item = widget();
        item.set(
            "options",
            json!([
                {"name": "size", "value": "XL"},
                {"name": "color", "value": "red"},
            ]),
        )
        .unwrap();

        assert!(item.has_options());
        assert_eq!(item.options().len(), 2);
        assert_eq!(item.option("size").unwrap().get("value").unwrap(), json!("XL"));
        // options never land in the plain attribute map
        assert!(!item.attributes().contains_key(OPTIONS));
    }

    #[test]
    fn test_single_option_mutator() {
        let mut item = widget();
        item.set("option", json!({"name": "gift", "value": true})).unwrap();

        assert_eq!(item.options().len(), 1);
        assert!(item.option("gift").is_some());
    }

    #[test]
    fn test_option_without_name_fails() {
        let mut item = widget();
        let result = item.set_option(json!({"value": "XL"}));

        assert!(matches!(result, Err(ItemError::AttributeNotFound { key }) if key == "name"));
    }

    #[test]
    fn test_options_accessor_returns_structural_form() {
        let mut item = widget();
        item.set_option(json!({"name": "size", "value": "M"})).unwrap();

        assert_eq!(
            item.get("options").unwrap(),
            json!({"size": {"name": "size", "value": "M"}})
        );
    }

    #[test]
    fn test_get_missing_attribute() {
        let item = widget();
        assert!(matches!(
            item.get("sku"),
            Err(ItemError::AttributeNotFound { .. })
        ));
    }

    #[test]
    fn test_offset_access_aliases_dynamic_access() {
        let mut item = widget();

        item.offset_set("sku", json!("W-1")).unwrap();
        assert!(item.offset_exists("sku"));
        assert_eq!(item.offset_get("sku").unwrap(), json!("W-1"));

        assert_eq!(item.offset_unset("sku"), Some(json!("W-1")));
        assert!(!item.has("sku"));
    }

    #[test]
    fn test_offset_exists_agrees_with_offset_get_for_options() {
        let mut item = widget();
        item.set_option(json!({"name": "size", "value": "M"})).unwrap();

        assert!(item.has_options());
        assert!(item.offset_exists(OPTIONS));
        assert_eq!(
            item.offset_get(OPTIONS).unwrap(),
            json!({"size": {"name": "size", "value": "M"}})
        );
        assert!(!item.attributes().contains_key(OPTIONS));
    }

    #[test]
    fn test_numeric_row_id_is_stored_as_string() {
        let mut item = Item::new();
        item.set(ROW_ID, json!(17)).unwrap();

        assert_eq!(item.row_id(), Some("17"));
    }

    #[test]
    fn test_to_value_nests_options() {
        let mut item = widget();
        item.set_option(json!({"name": "size", "value": "S"})).unwrap();

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["name"], json!("Widget"));
        assert_eq!(value["options"]["size"]["value"], json!("S"));
    }

    #[test]
    fn test_persisted_form_round_trips() {
        let mut item = widget();
        item.set_option(json!({"name": "size", "value": "S"})).unwrap();

        let restored = Item::from_attributes(attributes(item.to_value())).unwrap();
        assert_eq!(restored, item);
    }
}
