use lazy_static::lazy_static;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub host: String,
    pub port: u16,
    pub wizard_path: String,
    pub catalog_path: String,
    pub server_url: String,
    pub tracking_enabled: bool,
    pub debug_enabled: bool,
    pub watch: bool,
    pub cookie_jar_path: String,
    pub beacon_timeout_ms: u64,
    pub cookies: CookieSettings,
}

/// Names and lifetime of the two cookies the client keeps.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CookieSettings {
    pub form_state_name: String,
    pub session_name: String,
    pub max_age_days: i64,
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
            wizard_path: "wizard.yaml".to_string(),
            catalog_path: "catalog.yaml".to_string(),
            server_url: "http://127.0.0.1:8080".to_string(),
            tracking_enabled: true,
            debug_enabled: false,
            watch: true,
            cookie_jar_path: ".wayfinder-cookies".to_string(),
            beacon_timeout_ms: 1500,
            cookies: CookieSettings::default(),
        }
    }
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            form_state_name: "amv_form_state".to_string(),
            session_name: "amv_user_id".to_string(),
            max_age_days: 365,
            path: "/".to_string(),
        }
    }
}

impl Config {
    fn from_file(path: &str) -> Result<Self, serde_yaml::Error> {
        if !Path::new(path).exists() {
            return Ok(Config::default());
        }
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Could not read {}: {}. Falling back to defaults.", path, e);
                return Ok(Config::default());
            }
        };
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&content)
    }
}

lazy_static! {
    pub static ref CONFIG: Config = Config::from_file("config.yaml").unwrap_or_else(|e| {
        eprintln!("Your `config.yaml` could not be parsed: {}. Using the defaults instead.", e);
        Config::default()
    });
}
