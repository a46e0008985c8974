//! Service endpoints.
//!
//! Defaults point at a local mock server; `BANDS_API_URL` and
//! `GRAMMY_API_URL` override them.

pub const BANDS_API_URL_VAR: &str = "BANDS_API_URL";
pub const GRAMMY_API_URL_VAR: &str = "GRAMMY_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bands_base_url: String,
    pub grammy_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bands_base_url: "http://127.0.0.1:8080/bands".into(),
            grammy_base_url: "http://127.0.0.1:8080/grammy".into(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = value(BANDS_API_URL_VAR) {
            config.bands_base_url = v;
        }
        if let Some(v) = value(GRAMMY_API_URL_VAR) {
            config.grammy_base_url = v;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_without_overrides() {
        assert_eq!(ApiConfig::from_lookup(|_| None), ApiConfig::default());
    }

    #[test]
    fn overrides_are_applied_and_blank_values_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            (BANDS_API_URL_VAR, "https://labs.example:8445/bands"),
            (GRAMMY_API_URL_VAR, "  "),
        ]);
        let config = ApiConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.bands_base_url, "https://labs.example:8445/bands");
        assert_eq!(config.grammy_base_url, ApiConfig::default().grammy_base_url);
    }
}
