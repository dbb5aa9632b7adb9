use std::path::PathBuf;

use super::config::DeskConfig;

/// A discovered help desk on disk
#[derive(Debug, Clone)]
pub struct Desk {
    /// Directory that contains `helpdesk/`
    pub root: PathBuf,
    /// Path to the `helpdesk/` directory
    pub desk_dir: PathBuf,
    /// Parsed desk.toml
    pub config: DeskConfig,
}
