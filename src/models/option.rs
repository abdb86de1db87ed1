use serde::{Serialize, Serializer};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

use crate::models::attributes::{text, Attributes, HasAttributes};
use crate::models::item::ItemError;

/// A named choice attached to an item, e.g. `{"name": "size", "value": "XL"}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartOption {
    attributes: Attributes,
}

impl CartOption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_attributes(attributes: Attributes) -> Result<Self, ItemError> {
        let mut option = Self::new();
        option.fill(attributes)?;
        Ok(option)
    }

    /// The key this option is stored under on its item.
    pub fn name(&self) -> Option<String> {
        self.attributes.get("name").and_then(text)
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}

impl HasAttributes for CartOption {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }
}

impl Validate for CartOption {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }
}

impl Serialize for CartOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.serialize(serializer)
    }
}
