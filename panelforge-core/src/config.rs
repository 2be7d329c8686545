//! The process-wide configuration object `Engine::add_config()` /
//! `Engine::add_config_from_json()` install. A plain struct deserialised with
//! `serde`; no bespoke proc-macro, matching the rest of the crate's
//! avoidance of data-shape derive macros it does not already pull in for
//! other reasons.
//!
use serde::Deserialize;
use std::collections::HashMap;

/// One entry in [`Config::databases`](struct.Config.html#structfield.databases).
/// Not every field is meaningful to every driver -- a sqlite connection
/// reads `file` and ignores `host`/`port`/`user`/`password`; a postgres one
/// reads the reverse, or `dsn` in place of the discrete fields.
///
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DatabaseConfig {
    pub driver: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub dbname: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub dsn: Option<String>,
    #[serde(default = "default_max_idle_conns")]
    pub max_idle_conns: u32,
    #[serde(default = "default_max_open_conns")]
    pub max_open_conns: u32,
    #[serde(default)]
    pub conn_max_lifetime_secs: Option<u64>,
    #[serde(default)]
    pub conn_max_idle_time_secs: Option<u64>,
}

fn default_max_idle_conns() -> u32 {
    2
}

fn default_max_open_conns() -> u32 {
    10
}

/// Where uploaded files are written and the URL prefix they are served
/// back under.
///
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    pub prefix: String,
}

fn default_multipart_limit_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_language() -> String {
    "en".to_string()
}

fn default_theme() -> String {
    "default".to_string()
}

fn default_cookie_key() -> String {
    "panelforge_session".to_string()
}

fn default_session_table_name() -> String {
    "panelforge_sessions".to_string()
}

/// The process-wide configuration object. Treated as immutable once handed
/// to [`Engine::add_config()`](../engine/struct.Engine.html#method.add_config);
/// nothing in this crate mutates a `Config` after boot.
///
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub databases: HashMap<String, DatabaseConfig>,

    #[serde(default = "default_url_prefix")]
    pub url_prefix: String,

    #[serde(default = "default_index_url")]
    pub index_url: String,

    #[serde(default = "default_login_url")]
    pub login_url: String,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default = "default_language")]
    pub language: String,

    #[serde(default = "default_theme")]
    pub theme: String,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_env")]
    pub env: String,

    #[serde(default)]
    pub sql_log: bool,

    #[serde(default)]
    pub access_log_off: bool,

    #[serde(default = "default_cookie_key")]
    pub cookie_key: String,

    #[serde(default = "default_session_table_name", rename = "session-table-name")]
    pub session_table_name: String,

    #[serde(default)]
    pub domain: String,

    #[serde(default = "default_multipart_limit_bytes")]
    pub multipart_limit_bytes: usize,
}

fn default_url_prefix() -> String {
    "/admin".to_string()
}

fn default_index_url() -> String {
    "/".to_string()
}

fn default_login_url() -> String {
    "/admin/login".to_string()
}

fn default_env() -> String {
    "prod".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            databases: HashMap::new(),
            url_prefix: default_url_prefix(),
            index_url: default_index_url(),
            login_url: default_login_url(),
            store: StoreConfig::default(),
            language: default_language(),
            theme: default_theme(),
            debug: false,
            env: default_env(),
            sql_log: false,
            access_log_off: false,
            cookie_key: default_cookie_key(),
            session_table_name: default_session_table_name(),
            domain: String::new(),
            multipart_limit_bytes: default_multipart_limit_bytes(),
        }
    }
}

impl Config {
    /// Deserialize a `Config` from JSON, as `Engine::add_config_from_json()`
    /// does.
    ///
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(json).map_err(|e| crate::Error::parameter_invalid(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::default();
        assert_eq!(config.url_prefix, "/admin");
        assert_eq!(config.multipart_limit_bytes, 32 * 1024 * 1024);
        assert!(!config.debug);
    }

    #[test]
    fn from_json_accepts_rust_field_names() {
        let config = Config::from_json(r#"{"url_prefix": "/panel", "debug": true}"#).unwrap();
        assert_eq!(config.url_prefix, "/panel");
        assert!(config.debug);
    }
}
