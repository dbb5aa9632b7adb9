use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hd", about = concat!("helpdesk v", env!("CARGO_PKG_VERSION"), " - support tickets in two CSV files"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different desk directory
    #[arg(short = 'C', long = "desk-dir", global = true)]
    pub desk_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new help desk in the current directory
    Init(InitArgs),
    /// Submit a new ticket
    Submit(SubmitArgs),
    /// Search tickets by id or issue text
    Search(SearchArgs),
    /// Show the point-of-contact directory
    Poc,
    /// Ask the desk assistant (interactive when no text is given)
    Chat(ChatArgs),
    /// Show ticket counts by status, priority and department
    Stats(StatsArgs),
    /// Admin dashboard commands (password required)
    Admin(AdminCmd),
    /// View or manage the recovery log
    Recovery(RecoveryCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Desk name (default: "Support Tickets")
    #[arg(long)]
    pub name: Option<String>,
    /// Admin password written to desk.toml (default: admin123)
    #[arg(long)]
    pub password: Option<String>,
    /// Reinitialize even if helpdesk/ already exists
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// User-side args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SubmitArgs {
    /// Describe the issue
    pub issue: String,
    /// Full name of the submitter
    #[arg(long)]
    pub name: String,
    /// Mobile number of the submitter
    #[arg(long)]
    pub phone: String,
    /// Department (Comp, Mech, Electronic, Civil, IT, "Exam Cell")
    #[arg(long = "dept")]
    pub department: String,
    /// Priority (High, Medium, Low)
    #[arg(long, default_value = "Medium")]
    pub priority: String,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Keyword matched against ticket id and issue text
    pub keyword: String,
}

#[derive(Args)]
pub struct ChatArgs {
    /// Query text (omit for an interactive session)
    pub text: Vec<String>,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Limit counts to one department
    #[arg(long = "dept")]
    pub department: Option<String>,
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AdminCmd {
    /// Department to log in as, or "super" for all departments
    #[arg(short = 'd', long = "dept")]
    pub role: String,
    /// Admin password
    #[arg(short = 'p', long)]
    pub password: String,
    #[command(subcommand)]
    pub action: AdminAction,
}

#[derive(Subcommand)]
pub enum AdminAction {
    /// List tickets in the role's scope
    List(AdminListArgs),
    /// Edit one ticket's status, priority or resolution
    Set(AdminSetArgs),
    /// Write the current view to a CSV file for editing
    Export(AdminFileArgs),
    /// Apply an edited view file back to the ticket table
    Apply(AdminFileArgs),
    /// Delete a ticket (super admin only)
    Delete(AdminDeleteArgs),
    /// Edit a department's point of contact (super admin only)
    PocSet(PocSetArgs),
    /// Change the admin password (super admin only)
    Passwd(PasswdArgs),
}

#[derive(Args)]
pub struct AdminListArgs {
    /// Filter by keyword in id or issue
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct AdminSetArgs {
    /// Ticket ID
    pub id: String,
    /// New status (Open, "In Progress", Closed)
    #[arg(long)]
    pub status: Option<String>,
    /// New priority (High, Medium, Low)
    #[arg(long)]
    pub priority: Option<String>,
    /// New resolution text
    #[arg(long)]
    pub resolution: Option<String>,
}

#[derive(Args)]
pub struct AdminFileArgs {
    /// Path of the view file
    pub file: String,
    /// Only export tickets matching this keyword
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct AdminDeleteArgs {
    /// Ticket ID to delete
    pub id: String,
}

#[derive(Args)]
pub struct PocSetArgs {
    /// Department whose contact to change
    pub department: String,
    /// Contact name
    #[arg(long)]
    pub name: Option<String>,
    /// Contact phone
    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Args)]
pub struct PasswdArgs {
    /// The new password
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Show entries after this timestamp (ISO-8601)
    #[arg(long)]
    pub since: Option<String>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries
    Prune(RecoveryPruneArgs),
    /// Print the absolute path to the recovery log
    Path,
}

#[derive(Args)]
pub struct RecoveryPruneArgs {
    /// Remove entries older than this timestamp (default: 30 days ago)
    #[arg(long)]
    pub before: Option<String>,
    /// Remove all entries
    #[arg(long)]
    pub all: bool,
}
