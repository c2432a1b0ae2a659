//! # Configuration
//!
//! A string key/value store on the app, read through `app.set()` /
//! `app.get()`. Every hook receives an immutable snapshot taken when the
//! call started, so a config change never tears a running request.
//!
//! ```rust
//! use causa_core::CausaApp;
//! let app = CausaApp::<(), ()>::new();
//!
//! app.set("auth.fallback_route", "/dashboard");
//! assert_eq!(app.get("auth.fallback_route"), Some("/dashboard".to_string()));
//! ```
//!
//! ## Environment overrides
//! [`CausaConfig::load_env`] copies prefixed variables into the store,
//! lower-casing them and turning `__` into `.`:
//!
//! ```bash
//! export CAUSA__HTTP__PORT=8080   # → http.port = 8080
//! ```

use std::collections::HashMap;

pub const ENV_PREFIX: &str = "CAUSA__";

#[derive(Debug, Default)]
pub struct CausaConfig {
    values: HashMap<String, String>,
}

impl CausaConfig {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Set `key` only when nothing set it before.
    pub fn set_default<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.values.entry(key.into()).or_insert_with(|| value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Load overrides from any `(key, value)` source, normally `std::env::vars()`.
    /// Returns how many keys were applied.
    pub fn load_env<I>(&mut self, prefix: &str, vars: I) -> usize
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut applied = 0;
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(prefix) else {
                continue;
            };
            if stripped.is_empty() {
                continue;
            }
            let normalized = stripped.to_lowercase().replace("__", ".");
            self.values.insert(normalized, value);
            applied += 1;
        }
        applied
    }

    pub fn snapshot(&self) -> CausaConfigSnapshot {
        CausaConfigSnapshot::new(self.values.clone())
    }
}

#[derive(Debug, Clone, Default)]
pub struct CausaConfigSnapshot {
    map: HashMap<String, String>,
}

impl CausaConfigSnapshot {
    pub(crate) fn new(map: HashMap<String, String>) -> Self {
        Self { map }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.get(key).and_then(|v| v.trim().parse::<usize>().ok())
    }

    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key).and_then(|v| v.trim().parse::<u32>().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.trim().parse::<bool>().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_are_normalized() {
        let mut cfg = CausaConfig::new();
        let applied = cfg.load_env(
            ENV_PREFIX,
            vec![
                ("CAUSA__HTTP__PORT".to_string(), "8080".to_string()),
                ("CAUSA__AUTH__FALLBACK_ROUTE".to_string(), "/home".to_string()),
                ("PATH".to_string(), "/usr/bin".to_string()),
                ("CAUSA__".to_string(), "ignored".to_string()),
            ],
        );

        assert_eq!(applied, 2);
        assert_eq!(cfg.get("http.port"), Some("8080"));
        assert_eq!(cfg.get("auth.fallback_route"), Some("/home"));
        assert!(!cfg.has("path"));
    }

    #[test]
    fn defaults_do_not_clobber_explicit_values() {
        let mut cfg = CausaConfig::new();
        cfg.set("dashboard.limit", "5");
        cfg.set_default("dashboard.limit", "10");
        cfg.set_default("http.port", "3030");

        let snap = cfg.snapshot();
        assert_eq!(snap.get_usize("dashboard.limit"), Some(5));
        assert_eq!(snap.get_u32("http.port"), Some(3030));
        assert_eq!(snap.get_bool("http.port"), None);
        assert_eq!(snap.get_or("missing", "x"), "x");
    }
}
