use std::fs;
use std::path::{Path, PathBuf};

use crate::io::store::{FileStore, StoreError};
use crate::model::config::DeskConfig;
use crate::model::desk::Desk;

/// Name of the directory that marks a help desk
pub const DESK_DIR: &str = "helpdesk";
/// Config file inside the desk directory
pub const CONFIG_FILE: &str = "desk.toml";

/// Discover the help desk by walking up from the given directory,
/// looking for a `helpdesk/` subdirectory with a config file.
pub fn discover_desk(start: &Path) -> Result<PathBuf, StoreError> {
    let mut current = start.to_path_buf();
    loop {
        let desk_dir = current.join(DESK_DIR);
        if desk_dir.is_dir() && desk_dir.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(StoreError::NotADesk);
        }
    }
}

/// Load the desk config from the given root directory. Tables are not read
/// here; a session loads them through a [`FileStore`].
pub fn load_desk(root: &Path) -> Result<Desk, StoreError> {
    let desk_dir = root.join(DESK_DIR);
    if !desk_dir.is_dir() {
        return Err(StoreError::NotADesk);
    }

    let config_path = desk_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| StoreError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: DeskConfig = toml::from_str(&config_text)?;

    Ok(Desk {
        root: root.to_path_buf(),
        desk_dir,
        config,
    })
}

/// Table store over the desk's CSV files
pub fn file_store(desk: &Desk) -> FileStore {
    FileStore::new(&desk.desk_dir, &desk.config.files)
}
