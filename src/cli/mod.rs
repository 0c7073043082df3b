//! Command-line interface for `beans`.
//!
//! This module provides the CLI parsing and command routing using clap.

pub mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::config::CliOverrides;
use crate::format::ErrorResponse;
use crate::logging::{self, LogFormat};

/// `beans` - file-based issue tracker.
#[derive(Parser, Debug)]
#[command(name = "beans")]
#[command(
    author,
    version,
    about = "File-based issue tracker (markdown + YAML front matter)",
    long_about = None,
    after_help = "Beans live as markdown files in .beans/; edit them with any tool."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to data directory (overrides config and BEANS_PATH env var)
    #[arg(long, global = true, value_name = "PATH")]
    pub beans_path: Option<PathBuf>,

    /// Path to config file (default: searches upward for .beans.yml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a beans directory and config file
    Init(InitArgs),

    /// Create a new bean
    #[command(alias = "new")]
    Create(CreateArgs),

    /// List beans
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show bean details
    Show(ShowArgs),

    /// Update an existing bean
    Update(UpdateArgs),

    /// Delete a bean and remove links pointing at it
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Add a link between two beans
    Link(LinkArgs),

    /// Remove a link between two beans
    Unlink(LinkArgs),

    /// Rename legacy filenames to <id>--<slug>.md
    Migrate(MigrateArgs),

    /// Delete all beans with a finished status
    Archive(ArchiveArgs),

    /// Check the beans directory for problems
    Doctor,

    /// Follow changes to the beans directory
    Watch(WatchArgs),

    /// Show version information
    Version(VersionArgs),
}

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// ID prefix written to the new config (default: directory name + "-")
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct CreateArgs {
    /// Bean title
    pub title: Option<String>,

    /// Initial status
    #[arg(short, long)]
    pub status: Option<String>,

    /// Bean type (e.g., task, bug, epic)
    #[arg(short = 't', long = "type")]
    pub type_: Option<String>,

    /// Priority (e.g., high, normal)
    #[arg(long)]
    pub priority: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Parent bean id
    #[arg(long)]
    pub parent: Option<String>,

    /// Link as type:id (repeatable)
    #[arg(long = "link", value_name = "TYPE:ID")]
    pub links: Vec<String>,

    /// Body content (use '-' to read from stdin)
    #[arg(short = 'd', long)]
    pub body: Option<String>,

    /// Read body from file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Subdirectory within the beans directory
    #[arg(short, long)]
    pub path: Option<PathBuf>,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Filter by status (repeatable)
    #[arg(short, long)]
    pub status: Vec<String>,

    /// Filter by type (repeatable)
    #[arg(short = 't', long = "type")]
    pub type_: Vec<String>,

    /// Filter by priority (repeatable)
    #[arg(long)]
    pub priority: Vec<String>,

    /// Require tag (repeatable; all must match)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Title contains (case-insensitive)
    #[arg(long)]
    pub title_contains: Option<String>,

    /// Sort by: id, title, status, created, updated
    #[arg(long)]
    pub sort: Option<String>,

    /// Reverse the sort order
    #[arg(short, long)]
    pub reverse: bool,

    /// Maximum number of beans
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Bean ids
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct UpdateArgs {
    /// Bean id
    pub id: String,

    /// New status
    #[arg(short, long)]
    pub status: Option<String>,

    /// New type
    #[arg(long = "type")]
    pub type_: Option<String>,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New priority
    #[arg(long)]
    pub priority: Option<String>,

    /// New body (use '-' to read from stdin)
    #[arg(short = 'd', long)]
    pub body: Option<String>,

    /// Read new body from file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Add tag (repeatable)
    #[arg(long)]
    pub add_tag: Vec<String>,

    /// Remove tag (repeatable)
    #[arg(long)]
    pub remove_tag: Vec<String>,
}

#[derive(Args, Debug, Default)]
pub struct DeleteArgs {
    /// Bean id
    pub id: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug, Default)]
pub struct LinkArgs {
    /// Source bean id
    pub id: String,

    /// Link type: parent, blocks, relates, or duplicates
    pub link_type: String,

    /// Target bean id
    pub target: String,
}

#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Show what would be renamed without touching files
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ArchiveArgs {
    /// Status to archive
    #[arg(long, default_value = "done")]
    pub status: String,

    /// Skip confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Debounce window in milliseconds
    #[arg(long, default_value_t = 200)]
    pub debounce_ms: u64,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Print only the version number
    #[arg(long)]
    pub short: bool,
}

/// Run the CLI.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.log_json.then_some(LogFormat::Json);
    logging::init_logging(cli.verbose, cli.quiet, format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    let overrides = CliOverrides {
        beans_path: cli.beans_path,
        config_path: cli.config,
    };

    let Some(command) = cli.command else {
        println!("beans - file-based issue tracker. Use --help for usage.");
        return Ok(());
    };

    tracing::debug!(command = command.name(), "Dispatching");
    let result = dispatch(command, cli.json, &overrides);
    if cli.json {
        if let Err(err) = &result {
            ErrorResponse::from_error(err).print()?;
        }
    }
    result
}

fn dispatch(command: Commands, json: bool, overrides: &CliOverrides) -> Result<()> {
    match command {
        Commands::Init(args) => commands::init::execute(&args, json, overrides),
        Commands::Create(args) => commands::create::execute(args, json, overrides),
        Commands::List(args) => commands::list::execute(&args, json, overrides),
        Commands::Show(args) => commands::show::execute(&args.ids, json, overrides),
        Commands::Update(args) => commands::update::execute(args, json, overrides),
        Commands::Delete(args) => commands::delete::execute(&args, json, overrides),
        Commands::Link(args) => commands::link::execute_link(&args, json, overrides),
        Commands::Unlink(args) => commands::link::execute_unlink(&args, json, overrides),
        Commands::Migrate(args) => commands::migrate::execute(&args, json, overrides),
        Commands::Archive(args) => commands::archive::execute(&args, json, overrides),
        Commands::Doctor => commands::doctor::execute(json, overrides),
        Commands::Watch(args) => commands::watch::execute(&args, json, overrides),
        Commands::Version(args) => commands::version::execute(&args, json),
    }
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Create(_) => "create",
            Self::List(_) => "list",
            Self::Show(_) => "show",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Link(_) => "link",
            Self::Unlink(_) => "unlink",
            Self::Migrate(_) => "migrate",
            Self::Archive(_) => "archive",
            Self::Doctor => "doctor",
            Self::Watch(_) => "watch",
            Self::Version(_) => "version",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["beans", "list", "--json", "--beans-path", "/tmp/b"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.beans_path, Some(PathBuf::from("/tmp/b")));
        assert!(matches!(cli.command, Some(Commands::List(_))));
    }

    #[test]
    fn test_create_flags() {
        let cli = Cli::try_parse_from([
            "beans", "create", "Fix it", "-t", "bug", "--tag", "ui", "--tag", "auth", "--link",
            "blocks:a1",
        ])
        .unwrap();
        let Some(Commands::Create(args)) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.title.as_deref(), Some("Fix it"));
        assert_eq!(args.type_.as_deref(), Some("bug"));
        assert_eq!(args.tags, vec!["ui", "auth"]);
        assert_eq!(args.links, vec!["blocks:a1"]);
    }

    #[test]
    fn test_show_requires_id() {
        assert!(Cli::try_parse_from(["beans", "show"]).is_err());
    }
}
