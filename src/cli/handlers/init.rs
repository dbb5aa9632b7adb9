use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::commands::InitArgs;
use crate::io::config_io;
use crate::io::desk_io::{self, CONFIG_FILE, DESK_DIR};
use crate::io::store;

const DESK_TOML_TEMPLATE: &str = r##"[desk]
name = "Support Tickets"

# Table files, relative to this directory
[files]
tickets = "tickets.csv"
poc = "poc_details.csv"

# Plaintext password for the admin dashboard.
# Change with: hd admin -d super -p <current> passwd <new>
[admin]
password = "admin123"

# New ticket ids count up from the highest TICKET-<n> in the table.
# An empty table starts at seed + 1.
[ids]
seed = 1101

# The TUI drops its session (and admin login) after this much inactivity.
[session]
idle_timeout_mins = 30

# --- UI Customization ---
# Uncomment and edit to override defaults.

[ui]
# show_key_hints = false
#
# [ui.colors]
# background = "#10161F"
# text = "#C8D3E0"
# text_bright = "#FFFFFF"
# accent = "#3FC1C9"
# dim = "#6B7A8C"
# red = "#F05D5E"
# yellow = "#F5C242"
# green = "#5CD68A"
# blue = "#5B9BF0"
# selection_bg = "#1F3A4D"
# match_bg = "#F5C242"
# match_fg = "#10161F"
"##;

/// Render desk.toml with the given name and password. Values go through
/// toml_edit so quotes and backslashes are escaped.
fn render_desk_toml(name: &str, password: &str) -> Result<String, toml_edit::TomlError> {
    let mut doc: toml_edit::DocumentMut = DESK_TOML_TEMPLATE.parse()?;
    doc["desk"]["name"] = toml_edit::value(name);
    config_io::set_admin_password(&mut doc, password);
    Ok(doc.to_string())
}

pub fn cmd_init(args: InitArgs, dir: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let root: PathBuf = match dir {
        Some(d) => PathBuf::from(d),
        None => std::env::current_dir()?,
    };
    let desk_dir = root.join(DESK_DIR);

    if desk_dir.join(CONFIG_FILE).exists() && !args.force {
        return Err("help desk already exists in ./helpdesk/ (use --force to rewrite desk.toml)".into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = desk_io::discover_desk(parent)
    {
        eprintln!(
            "Note: parent desk found at {}/",
            parent_root.join(DESK_DIR).display()
        );
        eprintln!("Creating new desk in ./helpdesk/");
    }

    let name = args.name.unwrap_or_else(|| "Support Tickets".to_string());
    let password = args.password.unwrap_or_else(|| "admin123".to_string());

    fs::create_dir_all(&desk_dir)?;
    fs::write(desk_dir.join(CONFIG_FILE), render_desk_toml(&name, &password)?)?;

    // Existing tables are kept; missing ones are created with their defaults
    let desk = desk_io::load_desk(&root)?;
    let table_store = desk_io::file_store(&desk);
    let tickets = store::load_tickets(&table_store)?;
    store::load_or_init_poc(&table_store)?;

    println!("Initialized help desk: {}", name);
    print_table_line(&table_store.path(store::TableKind::Tickets), tickets.rows.len());
    println!("  poc:     {}", display_name(&table_store.path(store::TableKind::Poc)));

    Ok(())
}

fn print_table_line(path: &Path, rows: usize) {
    println!("  tickets: {} ({} rows)", display_name(path), rows);
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}
