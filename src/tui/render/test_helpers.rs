use std::rc::Rc;

use chrono::Utc;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::io::store::{MemoryStore, TableKind, TableStore};
use crate::model::DeskConfig;
use crate::tui::app::App;

pub const TERM_W: u16 = 100;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// Three tickets, newest first: two Comp, one IT
pub const SAMPLE_TICKETS: &str = "\
ID,Issue,Status,Priority,Date Submitted,Full Name,Mobile No,Department,Resolution
TICKET-1103,Projector flickers,Open,High,2026-03-01,Ravi Kumar,9820011111,Comp,
TICKET-1102,Wifi down in lab 3,In Progress,Medium,2026-02-27,Asha Patel,9820022222,IT,
TICKET-1101,Printer jam,Closed,Low,2026-02-20,Meera Shah,9820033333,Comp,Cleared tray
";

/// App over the given store with its session already open
pub fn app_with_store(store: Rc<MemoryStore>) -> App {
    let store: Rc<dyn TableStore> = store;
    let mut app = App::new(&DeskConfig::default(), store);
    app.open_session(Utc::now()).unwrap();
    app
}

pub fn app_with_tickets(csv: &str) -> App {
    app_with_store(Rc::new(
        MemoryStore::new().with_table(TableKind::Tickets, csv),
    ))
}

/// App over an empty store; both tables get created on open
pub fn empty_app() -> App {
    app_with_store(Rc::new(MemoryStore::new()))
}

pub fn logged_in_super(app: &mut App) {
    app.admin.password.set("admin123");
    app.login();
    assert!(app.role().is_some());
}
