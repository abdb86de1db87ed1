pub mod adjustment;
pub mod attributes;
pub mod item;
pub mod option;

pub use adjustment::{Adjustment, AdjustmentError};
pub use attributes::{Attributes, HasAttributes};
pub use item::{Item, ItemError};
pub use option::CartOption;
