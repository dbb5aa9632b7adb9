//! Integration tests for the `hd` CLI.
//!
//! Each test creates a temp desk directory, runs `hd` as a subprocess,
//! and verifies stdout and/or file contents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Get the path to the built `hd` binary.
fn hd_bin() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("hd");
    path
}

const TICKETS_CSV: &str = "\
ID,Issue,Status,Priority,Date Submitted,Full Name,Mobile No,Department,Resolution
TICKET-1103,Projector flickers,Open,High,2026-03-01,Ravi Kumar,9820011111,Comp,
TICKET-1102,Wifi down in lab 3,In Progress,Medium,2026-02-27,Asha Patel,9820022222,IT,
TICKET-1101,Printer jam,Closed,Low,2026-02-20,Meera Shah,9820033333,Comp,Cleared tray
";

/// Create a desk with three tickets. The POC table is left for the first
/// command to create.
fn create_test_desk(root: &Path) {
    let desk_dir = root.join("helpdesk");
    fs::create_dir_all(&desk_dir).unwrap();
    fs::write(
        desk_dir.join("desk.toml"),
        r#"[desk]
name = "Campus Support"

# keep this comment
[admin]
password = "admin123"
"#,
    )
    .unwrap();
    fs::write(desk_dir.join("tickets.csv"), TICKETS_CSV).unwrap();
}

fn read_desk_file(root: &Path, name: &str) -> String {
    fs::read_to_string(root.join("helpdesk").join(name)).unwrap()
}

/// Run `hd` with the given args in the given directory, returning (stdout, stderr, success).
fn run_hd(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(hd_bin())
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run hd");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `hd` expecting success, return stdout.
fn run_hd_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_hd(dir, args);
    if !success {
        panic!("hd {:?} failed:\nstdout: {}\nstderr: {}", args, stdout, stderr);
    }
    stdout
}

/// Run `hd` expecting failure, return stderr.
fn run_hd_err(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_hd(dir, args);
    if success {
        panic!("hd {:?} unexpectedly succeeded:\nstdout: {}", args, stdout);
    }
    stderr
}

/// Run `hd` with text piped to stdin, expecting success.
fn run_hd_stdin(dir: &Path, args: &[&str], input: &str) -> String {
    let mut child = Command::new(hd_bin())
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run hd");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "hd {:?} failed", args);
    String::from_utf8_lossy(&output.stdout).to_string()
}

const SUPER: [&str; 5] = ["admin", "-d", "super", "-p", "admin123"];

fn admin_args<'a>(role: &'a str, rest: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec!["admin", "-d", role, "-p", "admin123"];
    args.extend_from_slice(rest);
    args
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

#[test]
fn test_init_creates_config_and_tables() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_hd_ok(tmp.path(), &["init", "--name", "Lab Desk"]);
    assert!(out.contains("Initialized help desk: Lab Desk"));
    assert!(out.contains("tickets: tickets.csv (0 rows)"));

    let config = read_desk_file(tmp.path(), "desk.toml");
    assert!(config.contains("name = \"Lab Desk\""));
    assert!(config.contains("password = \"admin123\""));

    let tickets = read_desk_file(tmp.path(), "tickets.csv");
    assert_eq!(
        tickets,
        "ID,Issue,Status,Priority,Date Submitted,Full Name,Mobile No,Department,Resolution\n"
    );
    let poc = read_desk_file(tmp.path(), "poc_details.csv");
    assert_eq!(poc.lines().count(), 7);
    assert!(poc.contains("Exam Cell,No Name,0000000000"));
}

#[test]
fn test_init_refuses_to_overwrite() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_hd_ok(tmp.path(), &["init"]);
    let err = run_hd_err(tmp.path(), &["init"]);
    assert!(err.contains("already exists"));
    run_hd_ok(tmp.path(), &["init", "--force", "--password", "newpw"]);
    assert!(read_desk_file(tmp.path(), "desk.toml").contains("password = \"newpw\""));
}

#[test]
fn test_commands_outside_desk_fail() {
    let tmp = tempfile::TempDir::new().unwrap();
    let err = run_hd_err(tmp.path(), &["poc"]);
    assert!(err.starts_with("error:"));
}

#[test]
fn test_desk_dir_flag() {
    let tmp = tempfile::TempDir::new().unwrap();
    let desk = tmp.path().join("desk");
    let elsewhere = tmp.path().join("elsewhere");
    fs::create_dir_all(&desk).unwrap();
    fs::create_dir_all(&elsewhere).unwrap();
    create_test_desk(&desk);

    let out = run_hd_ok(&elsewhere, &["-C", desk.to_str().unwrap(), "search", "printer"]);
    assert!(out.contains("TICKET-1101"));
}

// ---------------------------------------------------------------------------
// Submission and search
// ---------------------------------------------------------------------------

#[test]
fn test_submit_on_empty_desk() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_hd_ok(tmp.path(), &["init"]);

    let out = run_hd_ok(
        tmp.path(),
        &["submit", "--name", "Kiran", "--phone", "9820000000", "--dept", "Comp", "Lab PC will not boot"],
    );
    assert!(out.contains("Ticket submitted!"));
    assert!(out.contains("TICKET-1102"));
    assert!(out.contains("Contact POC for Comp department"));
    assert!(out.contains("name:  No Name"));

    let tickets = read_desk_file(tmp.path(), "tickets.csv");
    assert!(tickets.contains("TICKET-1102,Lab PC will not boot,Open,Medium,"));
    assert!(tickets.ends_with(",Kiran,9820000000,Comp,\n"));
}

#[test]
fn test_submit_prepends_with_next_id() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());

    let out = run_hd_ok(
        tmp.path(),
        &[
            "submit", "--name", "Dev", "--phone", "9820044444", "--dept", "exam cell",
            "--priority", "high", "Hall ticket not issued",
        ],
    );
    assert!(out.contains("TICKET-1104"));
    let tickets = read_desk_file(tmp.path(), "tickets.csv");
    let second_line = tickets.lines().nth(1).unwrap();
    assert!(second_line.starts_with("TICKET-1104,Hall ticket not issued,Open,High,"));
    assert!(second_line.ends_with(",Exam Cell,"));
}

#[test]
fn test_submit_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(
        tmp.path(),
        &["submit", "--name", "Dev", "--phone", "1", "--dept", "IT", "--json", "VPN, again"],
    );
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["ticket"]["id"], "TICKET-1104");
    assert_eq!(parsed["ticket"]["status"], "Open");
    assert_eq!(parsed["ticket"]["department"], "IT");
    assert_eq!(parsed["contact"]["name"], "No Name");

    // Comma in the issue is quoted on disk
    assert!(read_desk_file(tmp.path(), "tickets.csv").contains("TICKET-1104,\"VPN, again\",Open"));
}

#[test]
fn test_submit_rejects_blank_fields() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let err = run_hd_err(
        tmp.path(),
        &["submit", "--name", "  ", "--phone", "1", "--dept", "IT", "Broken"],
    );
    assert!(err.starts_with("error: invalid ticket:"));
    assert_eq!(read_desk_file(tmp.path(), "tickets.csv"), TICKETS_CSV);
}

#[test]
fn test_submit_rejects_unknown_department() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let err = run_hd_err(
        tmp.path(),
        &["submit", "--name", "A", "--phone", "1", "--dept", "Library", "Broken"],
    );
    assert!(err.contains("Library"));
}

#[test]
fn test_search_matches_id_and_issue() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());

    let out = run_hd_ok(tmp.path(), &["search", "WIFI"]);
    assert!(out.starts_with("Found 1 matching tickets:"));
    assert!(out.contains("TICKET-1102"));

    let out = run_hd_ok(tmp.path(), &["search", "ticket-110"]);
    assert!(out.starts_with("Found 3 matching tickets:"));

    // Names are not searched
    let out = run_hd_ok(tmp.path(), &["search", "Meera"]);
    assert!(out.starts_with("Found 0 matching tickets:"));
}

#[test]
fn test_search_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(tmp.path(), &["search", "printer", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["count"], 1);
    assert_eq!(parsed["tickets"][0]["id"], "TICKET-1101");
    assert_eq!(parsed["tickets"][0]["resolution"], "Cleared tray");
}

// ---------------------------------------------------------------------------
// POC directory
// ---------------------------------------------------------------------------

#[test]
fn test_poc_is_created_with_placeholders() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(tmp.path(), &["poc"]);
    assert!(out.starts_with("Department"));
    assert_eq!(out.matches("No Name").count(), 6);
    assert!(tmp.path().join("helpdesk/poc_details.csv").exists());
}

#[test]
fn test_poc_backfills_missing_departments() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    fs::write(
        tmp.path().join("helpdesk/poc_details.csv"),
        "Department,POC Name,POC Phone\nIT,Sunil,09820055555\n",
    )
    .unwrap();

    let out = run_hd_ok(tmp.path(), &["poc", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["department"], "IT");
    assert_eq!(rows[0]["phone"], "09820055555");
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[test]
fn test_chat_on_empty_table() {
    let tmp = tempfile::TempDir::new().unwrap();
    run_hd_ok(tmp.path(), &["init"]);
    let out = run_hd_ok(tmp.path(), &["chat", "list", "all", "the", "tickets"]);
    assert_eq!(out, "No tickets found.\n");
}

#[test]
fn test_chat_status_query() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(tmp.path(), &["chat", "status of ticket-1101"]);
    assert!(out.starts_with("Status of TICKET-1101 is Closed."));
    assert!(out.contains("resolution: Cleared tray"));

    let out = run_hd_ok(tmp.path(), &["chat", "status", "of", "ticket-9999"]);
    assert_eq!(out, "Ticket TICKET-9999 not found.\n");
}

#[test]
fn test_chat_json_and_help() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(tmp.path(), &["chat", "show poc list", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["table"]["kind"], "poc");
    assert_eq!(parsed["table"]["rows"].as_array().unwrap().len(), 6);

    let out = run_hd_ok(tmp.path(), &["chat", "hello"]);
    assert!(out.starts_with("I can help with:"));
}

#[test]
fn test_chat_interactive() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_stdin(
        tmp.path(),
        &["chat"],
        "status of TICKET-1103\nclear\nquit\nlist all tickets\n",
    );
    assert!(out.contains("Status of TICKET-1103 is Open."));
    assert!(out.contains("History cleared."));
    // Nothing after quit is answered
    assert!(!out.contains("Here are all the tickets:"));
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[test]
fn test_stats() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(tmp.path(), &["stats"]);
    assert!(out.starts_with("3 tickets in all departments"));
    assert!(out.contains("status:      1 Open / 1 In Progress / 1 Closed"));

    let out = run_hd_ok(tmp.path(), &["stats", "--dept", "comp", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed["scope"], "Comp");
    assert_eq!(parsed["total"], 2);
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[test]
fn test_admin_wrong_password() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let err = run_hd_err(tmp.path(), &["admin", "-d", "super", "-p", "letmein", "list"]);
    assert_eq!(err, "error: access denied: incorrect password\n");
}

#[test]
fn test_admin_list_scoped() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(tmp.path(), &admin_args("comp", &["list"]));
    assert!(out.starts_with("Tickets for Comp\nTotal Tickets: 2\n"));
    assert!(out.contains("TICKET-1103"));
    assert!(out.contains("TICKET-1101"));
    assert!(!out.contains("TICKET-1102"));

    let out = run_hd_ok(tmp.path(), &admin_args("comp", &["list", "--search", "printer"]));
    assert!(out.contains("Total Tickets: 1"));
}

#[test]
fn test_admin_set_fields() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let out = run_hd_ok(
        tmp.path(),
        &admin_args(
            "IT",
            &["set", "ticket-1102", "--status", "closed", "--resolution", "Router rebooted"],
        ),
    );
    assert!(out.starts_with("Updated TICKET-1102"));
    assert!(
        read_desk_file(tmp.path(), "tickets.csv")
            .contains("TICKET-1102,Wifi down in lab 3,Closed,Medium,2026-02-27,Asha Patel,9820022222,IT,Router rebooted")
    );

    let out = run_hd_ok(tmp.path(), &admin_args("IT", &["set", "TICKET-1102", "--status", "Closed"]));
    assert!(out.starts_with("TICKET-1102 unchanged"));
}

#[test]
fn test_admin_set_out_of_scope() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let err = run_hd_err(
        tmp.path(),
        &admin_args("IT", &["set", "TICKET-1103", "--priority", "low"]),
    );
    assert!(err.contains("outside IT"));
    assert_eq!(read_desk_file(tmp.path(), "tickets.csv"), TICKETS_CSV);
}

#[test]
fn test_admin_delete_keeps_row_in_recovery_log() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());

    let err = run_hd_err(tmp.path(), &admin_args("comp", &["delete", "TICKET-1101"]));
    assert!(err.contains("super admin only"));

    let mut args = SUPER.to_vec();
    args.extend(["delete", "TICKET-1101"]);
    let out = run_hd_ok(tmp.path(), &args);
    assert_eq!(out, "Deleted TICKET-1101\n");
    assert!(!read_desk_file(tmp.path(), "tickets.csv").contains("TICKET-1101"));

    let out = run_hd_ok(tmp.path(), &["chat", "status of TICKET-1101"]);
    assert_eq!(out, "Ticket TICKET-1101 not found.\n");

    let log = run_hd_ok(tmp.path(), &["recovery"]);
    assert!(log.contains("| delete: ticket TICKET-1101 deleted"));
    assert!(log.contains("TICKET-1101,Printer jam,Closed,Low,2026-02-20,Meera Shah,9820033333,Comp,Cleared tray"));
}

#[test]
fn test_admin_poc_set() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let mut args = SUPER.to_vec();
    args.extend(["poc-set", "it", "--name", "Sunil", "--phone", "09820055555"]);
    let out = run_hd_ok(tmp.path(), &args);
    assert_eq!(out, "IT contact: Sunil (09820055555)\n");

    assert!(read_desk_file(tmp.path(), "poc_details.csv").contains("IT,Sunil,09820055555"));
    let out = run_hd_ok(tmp.path(), &["poc"]);
    assert!(out.contains("09820055555"));

    let err = run_hd_err(tmp.path(), &admin_args("IT", &["poc-set", "IT", "--name", "X"]));
    assert!(err.contains("super admin only"));
}

#[test]
fn test_admin_passwd_preserves_comments() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let mut args = SUPER.to_vec();
    args.extend(["passwd", "s3cret"]);
    let out = run_hd_ok(tmp.path(), &args);
    assert_eq!(out, "Admin password updated\n");

    let config = read_desk_file(tmp.path(), "desk.toml");
    assert!(config.contains("# keep this comment"));
    assert!(config.contains("password = \"s3cret\""));

    run_hd_err(tmp.path(), &["admin", "-d", "super", "-p", "admin123", "list"]);
    run_hd_ok(tmp.path(), &["admin", "-d", "super", "-p", "s3cret", "list"]);
}

#[test]
fn test_admin_export_edit_apply() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let view = tmp.path().join("view.csv");
    let view_str = view.to_str().unwrap();

    let mut args = SUPER.to_vec();
    args.extend(["export", view_str]);
    let out = run_hd_ok(tmp.path(), &args);
    assert_eq!(out, format!("Exported 3 tickets to {}\n", view_str));

    // Edit one row, drop another, add one without an id
    let edited = fs::read_to_string(&view)
        .unwrap()
        .replace("Wifi down in lab 3", "Wifi down in labs 3 and 4")
        .lines()
        .filter(|l| !l.starts_with("TICKET-1101"))
        .map(|l| format!("{}\n", l))
        .collect::<String>()
        + ",Kettle tripped breaker,Open,Low,2026-03-02,Dev,9820044444,Civil,\n";
    fs::write(&view, edited).unwrap();

    let mut args = SUPER.to_vec();
    args.extend(["apply", view_str]);
    let out = run_hd_ok(tmp.path(), &args);
    assert!(out.starts_with("1 updated, 1 added, 1 removed, 0 skipped"));
    assert!(out.contains("added TICKET-1104"));
    assert!(out.contains("removed TICKET-1101"));

    let tickets = read_desk_file(tmp.path(), "tickets.csv");
    assert!(tickets.contains("TICKET-1102,Wifi down in labs 3 and 4,"));
    assert!(!tickets.contains("TICKET-1101"));
    assert!(tickets.ends_with("TICKET-1104,Kettle tripped breaker,Open,Low,2026-03-02,Dev,9820044444,Civil,\n"));
}

#[test]
fn test_scoped_apply_ignores_read_only_columns() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let view = tmp.path().join("comp.csv");
    let view_str = view.to_str().unwrap();
    run_hd_ok(tmp.path(), &admin_args("comp", &["export", view_str]));

    let edited = fs::read_to_string(&view)
        .unwrap()
        .replace("Projector flickers,Open,High", "Projector replaced,Closed,High");
    fs::write(&view, edited).unwrap();

    let out = run_hd_ok(tmp.path(), &admin_args("comp", &["apply", view_str]));
    assert!(out.starts_with("1 updated, 0 added, 0 removed, 0 skipped"));
    let tickets = read_desk_file(tmp.path(), "tickets.csv");
    // Status changes, the issue text does not
    assert!(tickets.contains("TICKET-1103,Projector flickers,Closed,High,"));
}

#[test]
fn test_apply_with_bad_row_changes_nothing() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let view = tmp.path().join("view.csv");
    let view_str = view.to_str().unwrap();
    fs::write(
        &view,
        "ID,Issue,Status,Priority,Date Submitted,Full Name,Mobile No,Department,Resolution\n\
         TICKET-1103,Projector flickers,Maybe,High,2026-03-01,Ravi Kumar,9820011111,Comp,\n",
    )
    .unwrap();

    let mut args = SUPER.to_vec();
    args.extend(["apply", view_str]);
    let err = run_hd_err(tmp.path(), &args);
    assert!(err.contains("nothing changed"));
    assert_eq!(read_desk_file(tmp.path(), "tickets.csv"), TICKETS_CSV);
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[test]
fn test_malformed_rows_go_to_recovery_log() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());
    let mut csv = TICKETS_CSV.to_string();
    csv.push_str("TICKET-1100,Old row,Sideways,Low,2026-01-01,X,1,Comp,\n");
    fs::write(tmp.path().join("helpdesk/tickets.csv"), csv).unwrap();

    let out = run_hd_ok(tmp.path(), &["search", "old row"]);
    assert!(out.starts_with("Found 0 matching tickets:"));

    let out = run_hd_ok(tmp.path(), &["recovery", "--json"]);
    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["category"], "parser");
    assert!(entries[0]["body"].as_str().unwrap().contains("Sideways"));
}

#[test]
fn test_recovery_empty_path_and_prune() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_desk(tmp.path());

    let out = run_hd_ok(tmp.path(), &["recovery"]);
    assert_eq!(out, "No recovery entries.\n");

    let out = run_hd_ok(tmp.path(), &["recovery", "path"]);
    assert!(out.trim_end().ends_with(".recovery.log"));

    let mut args = SUPER.to_vec();
    args.extend(["delete", "TICKET-1103"]);
    run_hd_ok(tmp.path(), &args);

    let out = run_hd_ok(tmp.path(), &["recovery", "prune", "--all"]);
    assert_eq!(out, "Pruned 1 recovery entries\n");
    let out = run_hd_ok(tmp.path(), &["recovery"]);
    assert_eq!(out, "No recovery entries.\n");
}
