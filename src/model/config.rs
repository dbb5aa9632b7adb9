use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration from desk.toml. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default)]
    pub desk: DeskInfo,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub ids: IdConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskInfo {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for DeskInfo {
    fn default() -> Self {
        DeskInfo {
            name: default_name(),
        }
    }
}

fn default_name() -> String {
    "Support Tickets".to_string()
}

/// Table file names, relative to the desk directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_tickets_file")]
    pub tickets: String,
    #[serde(default = "default_poc_file")]
    pub poc: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        FilesConfig {
            tickets: default_tickets_file(),
            poc: default_poc_file(),
        }
    }
}

fn default_tickets_file() -> String {
    "tickets.csv".to_string()
}

fn default_poc_file() -> String {
    "poc_details.csv".to_string()
}

/// Admin dashboard access. The password is a plaintext literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        AdminConfig {
            password: default_password(),
        }
    }
}

fn default_password() -> String {
    "admin123".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdConfig {
    /// Allocation starts after this number when no id can be parsed
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for IdConfig {
    fn default() -> Self {
        IdConfig {
            seed: default_seed(),
        }
    }
}

fn default_seed() -> u64 {
    1101
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Minutes of inactivity before a session is dropped
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_mins: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            idle_timeout_mins: default_idle_timeout(),
        }
    }
}

fn default_idle_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_true")]
    pub show_key_hints: bool,
    /// Hex color overrides keyed by theme slot (e.g. `background = "#0C001B"`)
    #[serde(default)]
    pub colors: HashMap<String, String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_key_hints: true,
            colors: HashMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}
