pub mod args;
pub mod commands;
pub mod explore;

pub use args::{Cli, Commands, ExportFormat, OutputFormat, SelectionArgs};
pub use commands::{load_table, resolve_selection, run};
pub use explore::{run_session, ExploreSession, SessionCommand};
