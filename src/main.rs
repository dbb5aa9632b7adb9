use clap::Parser;
use helpdesk::cli::commands::{Cli, Commands};
use helpdesk::cli::handlers;

fn main() {
    let cli = Cli::parse();
    let desk_dir = cli.desk_dir.clone();

    let result = match cli.command {
        // No subcommand → launch TUI
        None => helpdesk::tui::run(desk_dir.as_deref()),
        // Init is handled before desk discovery
        Some(Commands::Init(args)) => handlers::cmd_init(args, desk_dir.as_deref()),
        Some(_) => handlers::dispatch(cli),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
