mod init;
pub use init::cmd_init;

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Local, Utc};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::desk_io;
use crate::io::store::{StoreError, TableStore};
use crate::io::{config_io, recovery};
use crate::model::desk::Desk;
use crate::model::ticket::{Department, Priority, TicketId, TicketStatus};
use crate::ops::filter::Scope;
use crate::ops::session::{DeskError, Session, SessionId};
use crate::ops::ticket_ops::{NewTicket, Role};
use crate::parse::{parse_edited_view, serialize_tickets};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let start = resolve_start(cli.desk_dir.as_deref())?;

    match cli.command {
        None => {
            eprintln!("Use a subcommand (try `hd --help`), or run `hd` alone for the TUI.");
            Ok(())
        }
        Some(cmd) => match cmd {
            // Init is handled in main.rs before desk discovery
            Commands::Init(args) => cmd_init(args, cli.desk_dir.as_deref()),

            // User panel
            Commands::Submit(args) => cmd_submit(&start, args, json),
            Commands::Search(args) => cmd_search(&start, args, json),
            Commands::Poc => cmd_poc(&start, json),
            Commands::Chat(args) => cmd_chat(&start, args, json),
            Commands::Stats(args) => cmd_stats(&start, args, json),

            // Admin dashboard
            Commands::Admin(args) => cmd_admin(&start, args, json),

            // Maintenance
            Commands::Recovery(args) => cmd_recovery(&start, args, json),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Directory to start desk discovery from: the -C override or the cwd
pub fn resolve_start(dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match dir {
        Some(d) => std::fs::canonicalize(d)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", d, e).into()),
        None => Ok(std::env::current_dir()?),
    }
}

fn load_desk(start: &Path) -> Result<Desk, StoreError> {
    let root = desk_io::discover_desk(start)?;
    desk_io::load_desk(&root)
}

/// Each CLI invocation is one interaction against a fresh session
fn open_session(start: &Path) -> Result<(Desk, Session), StoreError> {
    let desk = load_desk(start)?;
    let store: Rc<dyn TableStore> = Rc::new(desk_io::file_store(&desk));
    let session = Session::open(SessionId::new("cli"), store, desk.config.ids.seed, Utc::now())?;
    Ok((desk, session))
}

/// Accept `ticket-1102` for `TICKET-1102`; anything else is taken as typed
fn parse_ticket_id(s: &str) -> TicketId {
    let id = TicketId::new(s.trim());
    match id.number() {
        Some(n) => TicketId::from_number(n),
        None => id,
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, Box<dyn std::error::Error>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", s, e).into())
}

// ---------------------------------------------------------------------------
// User panel
// ---------------------------------------------------------------------------

fn cmd_submit(start: &Path, args: SubmitArgs, json: bool) -> CmdResult {
    let (_, mut session) = open_session(start)?;
    let form = NewTicket {
        full_name: args.name,
        mobile_no: args.phone,
        department: args.department.parse::<Department>()?,
        priority: args.priority.parse::<Priority>()?,
        issue: args.issue,
    };
    let sub = session.submit(form, Local::now().date_naive())?;

    if json {
        print_json(&SubmissionJson {
            ticket: &sub.ticket,
            contact: &sub.contact,
        })
    } else {
        print_lines(&format_submission(&sub));
        Ok(())
    }
}

fn cmd_search(start: &Path, args: SearchArgs, json: bool) -> CmdResult {
    let (_, session) = open_session(start)?;
    let results = session.search(&args.keyword);

    if json {
        return print_json(&TicketListJson {
            scope: Scope::All.to_string(),
            count: results.len(),
            tickets: &results,
        });
    }
    println!("Found {} matching tickets:", results.len());
    if !results.is_empty() {
        print_lines(&format_ticket_table(&results));
    }
    Ok(())
}

fn cmd_poc(start: &Path, json: bool) -> CmdResult {
    let (_, session) = open_session(start)?;
    if json {
        print_json(&poc_to_json(session.poc()))
    } else {
        print_lines(&format_poc_table(session.poc()));
        Ok(())
    }
}

fn cmd_chat(start: &Path, args: ChatArgs, json: bool) -> CmdResult {
    let (_, mut session) = open_session(start)?;

    if !args.text.is_empty() {
        let response = session.chat(&args.text.join(" "));
        return if json {
            print_json(&response)
        } else {
            print_lines(&format_chat_response(&response));
            Ok(())
        };
    }

    // Interactive: one query per line until quit or end of input
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    if !json {
        println!("Ask about tickets or contacts. Type 'clear' to reset, 'quit' to leave.");
    }
    loop {
        if !json {
            print!("> ");
            stdout.flush()?;
        }
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim();
        match query {
            "" => continue,
            "quit" | "exit" => break,
            "clear" => {
                session.clear_chat();
                if !json {
                    println!("History cleared.");
                }
            }
            _ => {
                let response = session.chat(query);
                if json {
                    println!("{}", serde_json::to_string(&response)?);
                } else {
                    print_lines(&format_chat_response(&response));
                }
            }
        }
    }
    Ok(())
}

fn cmd_stats(start: &Path, args: StatsArgs, json: bool) -> CmdResult {
    let (_, session) = open_session(start)?;
    let scope = match args.department {
        Some(d) => Scope::Department(d.parse::<Department>()?),
        None => Scope::All,
    };
    let stats = session.stats(scope);

    if json {
        print_json(&StatsJson {
            scope: scope.to_string(),
            stats: &stats,
        })
    } else {
        print_lines(&format_stats(&stats, &scope.to_string()));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Admin dashboard
// ---------------------------------------------------------------------------

fn cmd_admin(start: &Path, args: AdminCmd, json: bool) -> CmdResult {
    let (desk, mut session) = open_session(start)?;
    let role = args.role.parse::<Role>()?;
    session.login(role, &args.password, &desk.config.admin)?;

    match args.action {
        AdminAction::List(a) => admin_list(&session, role, a, json),
        AdminAction::Set(a) => admin_set(&mut session, a, json),
        AdminAction::Export(a) => admin_export(&session, a, json),
        AdminAction::Apply(a) => admin_apply(&mut session, a, json),
        AdminAction::Delete(a) => {
            let removed = session.delete(&parse_ticket_id(&a.id))?;
            if json {
                print_json(&removed)
            } else {
                println!("Deleted {}", removed.id);
                Ok(())
            }
        }
        AdminAction::PocSet(a) => {
            let dept = a.department.parse::<Department>()?;
            let changed = session.edit_poc(dept, a.name.as_deref(), a.phone.as_deref())?;
            if json {
                return print_json(&poc_to_json(session.poc()));
            }
            let contact = session.poc().contact(dept);
            if changed {
                println!("{} contact: {} ({})", dept, contact.name, contact.phone);
            } else {
                println!("{} contact unchanged", dept);
            }
            Ok(())
        }
        AdminAction::Passwd(a) => admin_passwd(&desk, role, a, json),
    }
}

fn admin_list(session: &Session, role: Role, args: AdminListArgs, json: bool) -> CmdResult {
    let view = session.admin_view(args.search.as_deref().unwrap_or(""))?;
    if json {
        return print_json(&TicketListJson {
            scope: role.scope().to_string(),
            count: view.len(),
            tickets: &view,
        });
    }
    println!("Tickets for {}", role);
    println!("Total Tickets: {}", view.len());
    if !view.is_empty() {
        println!();
        print_lines(&format_ticket_table(&view));
    }
    Ok(())
}

fn admin_set(session: &mut Session, args: AdminSetArgs, json: bool) -> CmdResult {
    if args.status.is_none() && args.priority.is_none() && args.resolution.is_none() {
        return Err("nothing to change: give --status, --priority or --resolution".into());
    }
    let id = parse_ticket_id(&args.id);
    let mut changed = false;
    if let Some(s) = args.status {
        changed |= session.set_status(&id, s.parse::<TicketStatus>()?)?;
    }
    if let Some(p) = args.priority {
        changed |= session.set_priority(&id, p.parse::<Priority>()?)?;
    }
    if let Some(r) = args.resolution {
        changed |= session.set_resolution(&id, &r)?;
    }

    let ticket = session
        .tickets()
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| format!("ticket not found: {}", id))?;
    if json {
        return print_json(ticket);
    }
    if changed {
        println!("Updated {}", id);
    } else {
        println!("{} unchanged", id);
    }
    print_lines(&format_ticket_detail(ticket));
    Ok(())
}

fn admin_export(session: &Session, args: AdminFileArgs, json: bool) -> CmdResult {
    let view = session.admin_view(args.search.as_deref().unwrap_or(""))?;
    let path = PathBuf::from(&args.file);
    recovery::atomic_write(&path, serialize_tickets(&view).as_bytes())?;
    if json {
        print_json(&serde_json::json!({ "file": args.file, "count": view.len() }))
    } else {
        println!("Exported {} tickets to {}", view.len(), args.file);
        Ok(())
    }
}

/// Apply an edited view. The view ids are recomputed with the same search
/// the export used, so rows deleted from the file can be told apart from
/// rows that were never exported.
fn admin_apply(session: &mut Session, args: AdminFileArgs, json: bool) -> CmdResult {
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file, e))?;
    let parsed = parse_edited_view(&text);
    if let Some(bad) = parsed.dropped.first() {
        return Err(format!(
            "could not apply {}: line {}: {} ({} bad rows, nothing changed)",
            args.file,
            bad.line,
            bad.reason,
            parsed.dropped.len()
        )
        .into());
    }

    let view_ids: Vec<TicketId> = session
        .admin_view(args.search.as_deref().unwrap_or(""))?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let report = session.apply_edits(&view_ids, parsed.rows)?;

    if json {
        print_json(&report)
    } else {
        print_lines(&format_reconcile_report(&report));
        Ok(())
    }
}

fn admin_passwd(desk: &Desk, role: Role, args: PasswdArgs, json: bool) -> CmdResult {
    if !role.is_super() {
        return Err(DeskError::SuperOnly.into());
    }
    if args.new_password.trim().is_empty() {
        return Err("password must not be empty".into());
    }
    let (_, mut doc) = config_io::read_config(&desk.desk_dir)?;
    config_io::set_admin_password(&mut doc, &args.new_password);
    config_io::write_config(&desk.desk_dir, &doc)?;
    if json {
        print_json(&serde_json::json!({ "updated": "admin.password" }))
    } else {
        println!("Admin password updated");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

fn cmd_recovery(start: &Path, args: RecoveryCmd, json: bool) -> CmdResult {
    let desk = load_desk(start)?;

    match args.action {
        Some(RecoveryAction::Path) => {
            println!("{}", recovery::recovery_log_path(&desk.desk_dir).display());
            Ok(())
        }
        Some(RecoveryAction::Prune(p)) => {
            let before = p.before.as_deref().map(parse_timestamp).transpose()?;
            let removed = recovery::prune_recovery(&desk.desk_dir, before, p.all)?;
            if json {
                print_json(&serde_json::json!({ "removed": removed }))
            } else {
                println!("Pruned {} recovery entries", removed);
                Ok(())
            }
        }
        None => {
            let since = args.since.as_deref().map(parse_timestamp).transpose()?;
            let limit = args.limit.unwrap_or(10);
            let entries = recovery::read_recovery_entries(&desk.desk_dir, Some(limit), since);
            if json {
                let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
                return print_json(&values);
            }
            if entries.is_empty() {
                println!("No recovery entries.");
            }
            for entry in &entries {
                print!("{}", entry.to_display_markdown());
            }
            Ok(())
        }
    }
}
