use std::fs;
use std::path::Path;

use crate::io::desk_io::CONFIG_FILE;
use crate::io::recovery::atomic_write;
use crate::io::store::StoreError;
use crate::model::config::DeskConfig;

/// Read the desk config, returning both the parsed config and the raw
/// toml_edit document for format-preserving edits.
pub fn read_config(desk_dir: &Path) -> Result<(DeskConfig, toml_edit::DocumentMut), StoreError> {
    let config_path = desk_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| StoreError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: DeskConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(desk_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), StoreError> {
    let config_path = desk_dir.join(CONFIG_FILE);
    atomic_write(&config_path, doc.to_string().as_bytes()).map_err(|e| StoreError::WriteError {
        path: config_path,
        source: e,
    })
}

/// Set `[admin] password` in the config document
pub fn set_admin_password(doc: &mut toml_edit::DocumentMut, password: &str) {
    if !doc.contains_key("admin") {
        doc["admin"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["admin"]["password"] = toml_edit::value(password);
}
