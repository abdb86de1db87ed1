pub mod cli;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

pub use anyhow::{Error, Result};
pub use models::{Adjustment, Attributes, CartOption, HasAttributes, Item};
pub use services::{Cart, CartError, ItemInput, RemoveTarget};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use utils::config::{CartConfig, ConfigStore};
