use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// 1 = single-slot memoization, more = LRU.
    pub highlight_cache_slots: usize,
    pub max_document_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let highlight_cache_slots = parse_or(&lookup, "HIGHLIGHT_CACHE_SLOTS", 1usize)?;
        if highlight_cache_slots == 0 {
            bail!("HIGHLIGHT_CACHE_SLOTS must be at least 1");
        }

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080u16)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            highlight_cache_slots,
            max_document_bytes: parse_or(&lookup, "MAX_DOCUMENT_BYTES", 1024 * 1024)?,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.highlight_cache_slots, 1);
        assert_eq!(config.max_document_bytes, 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("RUST_LOG", "debug"),
            ("HIGHLIGHT_CACHE_SLOTS", "8"),
            ("MAX_DOCUMENT_BYTES", "4096"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.rust_log, "debug");
        assert_eq!(config.highlight_cache_slots, 8);
        assert_eq!(config.max_document_bytes, 4096);
    }

    #[test]
    fn test_invalid_port_names_variable() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_zero_cache_slots_rejected() {
        assert!(config_from(&[("HIGHLIGHT_CACHE_SLOTS", "0")]).is_err());
    }
}
