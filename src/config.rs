//! Runtime configuration: defaults, then a JSON override in localStorage, then `?api=` in the URL.

use serde::{Deserialize, Serialize};


pub const CONFIG_STORAGE_KEY: &str = "marknote.config";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    pub api_base: String,
    pub draft_key: String,
    pub show_files_on_start: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api".to_string(),
            draft_key: "markdown-content".to_string(),
            show_files_on_start: false,
        }
    }
}

impl EditorConfig {
    /// Reads the stored override and the page query string from the browser.
    pub fn load() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            let window = web_sys::window();
            let stored = window
                .as_ref()
                .and_then(|w| w.local_storage().ok().flatten())
                .and_then(|storage| storage.get_item(CONFIG_STORAGE_KEY).ok().flatten());
            let search = window
                .and_then(|w| w.location().search().ok())
                .unwrap_or_default();
            Self::from_sources(stored.as_deref(), &search)
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::default()
        }
    }

    pub fn from_sources(stored_json: Option<&str>, search: &str) -> Self {
        let mut config = match stored_json {
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|err| {
                leptos::logging::warn!("Ignoring invalid {CONFIG_STORAGE_KEY}: {err}");
                Self::default()
            }),
            None => Self::default(),
        };
        if let Some(api) = query_param(search, "api").filter(|api| !api.is_empty()) {
            config.api_base = api;
        }
        config
    }
}

fn query_param(search: &str, name: &str) -> Option<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            let value = value.replace('+', " ");
            match urlencoding::decode(&value) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => value.clone(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = EditorConfig::from_sources(None, "");
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.api_base, "http://localhost:5000/api");
        assert_eq!(config.draft_key, "markdown-content");
    }

    #[test]
    fn stored_json_overrides_only_given_fields() {
        let config =
            EditorConfig::from_sources(Some(r#"{"show_files_on_start": true}"#), "");
        assert!(config.show_files_on_start);
        assert_eq!(config.draft_key, "markdown-content");
    }

    #[test]
    fn invalid_stored_json_falls_back_to_defaults() {
        let config = EditorConfig::from_sources(Some("{not json"), "");
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn query_api_wins_over_stored_value() {
        let config = EditorConfig::from_sources(
            Some(r#"{"api_base": "http://stored/api"}"#),
            "?mode=x&api=https%3A%2F%2Fnotes.example%2Fapi",
        );
        assert_eq!(config.api_base, "https://notes.example/api");
    }

    #[test]
    fn query_param_decodes_plus_and_keeps_malformed_escapes() {
        assert_eq!(
            query_param("?api=a+b%20c", "api").as_deref(),
            Some("a b c")
        );
        assert_eq!(query_param("?api=100%", "api").as_deref(), Some("100%"));
        assert_eq!(query_param("?api=%C3%A9", "api").as_deref(), Some("é"));
        assert_eq!(query_param("?other=1", "api"), None);
    }
}
