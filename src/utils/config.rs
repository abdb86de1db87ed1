use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

/// Namespace the cart's settings live under in a host configuration store.
pub const NAMESPACE: &str = "cart";

pub const DEFAULT_SESSION_KEY: &str = "cart";
pub const DEFAULT_SESSION_FILE: &str = ".cart-session.json";

/// Configuration lookup provided by the host application.
pub trait ConfigStore {
    fn get(&self, name: &str) -> Option<Value>;
}

impl ConfigStore for HashMap<String, Value> {
    fn get(&self, name: &str) -> Option<Value> {
        HashMap::get(self, name).cloned()
    }
}

#[derive(Debug, Clone)]
pub struct CartConfig {
    pub session_key: String,
    pub auto_save: bool,
    pub session_file: PathBuf,
    pub log_level: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            session_key: DEFAULT_SESSION_KEY.to_string(),
            auto_save: false,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            log_level: "info".to_string(),
        }
    }
}

impl CartConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        let defaults = CartConfig::default();

        let auto_save = match env::var("CART_AUTO_SAVE") {
            Ok(value) => parse_flag(&value)
                .ok_or_else(|| anyhow::anyhow!("CART_AUTO_SAVE must be true or false, got '{}'", value))?,
            Err(_) => defaults.auto_save,
        };

        let config = CartConfig {
            session_key: env::var("CART_SESSION_KEY").unwrap_or(defaults.session_key),
            auto_save,
            session_file: env::var("CART_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;
        tracing::info!(
            "Config: session key '{}', auto-save {}",
            config.session_key,
            config.auto_save
        );
        Ok(config)
    }

    /// Read `cart::sessionKey` and `cart::autoSave` from a host configuration store.
    pub fn from_store(store: &dyn ConfigStore) -> anyhow::Result<Self> {
        let mut config = CartConfig::default();

        match store.get(&format!("{}::sessionKey", NAMESPACE)) {
            Some(Value::String(key)) => config.session_key = key,
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(anyhow::anyhow!(
                    "{}::sessionKey must be a string, got {}",
                    NAMESPACE,
                    other
                ))
            }
        }

        match store.get(&format!("{}::autoSave", NAMESPACE)) {
            Some(Value::Bool(flag)) => config.auto_save = flag,
            Some(Value::Number(number)) => config.auto_save = number.as_f64() != Some(0.0),
            Some(Value::String(text)) => {
                config.auto_save = parse_flag(&text).ok_or_else(|| {
                    anyhow::anyhow!("{}::autoSave must be a boolean, got '{}'", NAMESPACE, text)
                })?
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(anyhow::anyhow!(
                    "{}::autoSave must be a boolean, got {}",
                    NAMESPACE,
                    other
                ))
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.session_key.trim().is_empty() {
            return Err(anyhow::anyhow!("Cart session key must not be empty"));
        }

        if self.session_file.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("CART_SESSION_FILE must not be empty"));
        }

        Ok(())
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
