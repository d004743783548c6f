use std::path::PathBuf;

/// Sample stdin payload shown in the help text.
pub const EXAMPLE_SESSION: &str = r#"{
  "session_id": "abc123",
  "transcript_path": "/home/me/.claude/projects/app/abc123.jsonl",
  "cwd": "/home/me/app",
  "model": { "id": "claude-opus-4-1", "display_name": "Opus 4.1" },
  "workspace": { "current_dir": "/home/me/app", "project_dir": "/home/me/app" },
  "version": "1.0.80",
  "cost": {
    "total_cost_usd": 0.42,
    "total_duration_ms": 90000,
    "total_api_duration_ms": 30000,
    "total_lines_added": 12,
    "total_lines_removed": 3
  }
}"#;

#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandArg {
    /// Print usage and an example session payload
    Help,
    /// Print the version and target platform
    Version,
}

/// What the binary should do for this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Help,
    Version,
    Render,
}

#[derive(clap::Parser, Debug)]
#[command(
    name = "ccstatus",
    disable_help_flag = true,
    disable_version_flag = true,
    disable_help_subcommand = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<CommandArg>,

    /// Print usage and an example session payload
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// Print the version and target platform
    #[arg(short = 'V', long = "version")]
    pub version: bool,

    /// Debug logging to stderr
    #[arg(long, global = true, env = "CCSTATUS_DEBUG")]
    pub debug: bool,

    /// User-level config file, replacing ~/.claude/ccstatus.yaml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }

    pub fn action(&self) -> Action {
        match self.command {
            Some(CommandArg::Help) => Action::Help,
            Some(CommandArg::Version) => Action::Version,
            None if self.help => Action::Help,
            None if self.version => Action::Version,
            None => Action::Render,
        }
    }
}

pub fn help_text() -> String {
    format!(
        "ccstatus {version}\n\
         Status line for Claude Code.\n\
         \n\
         USAGE:\n    \
             ccstatus [--debug] [--config <PATH>] < session.json\n    \
             ccstatus help\n    \
             ccstatus version\n\
         \n\
         Reads one session JSON document on stdin and prints the status line.\n\
         \n\
         CONFIG (later files win):\n    \
             ~/.claude/ccstatus.yaml  (or $CCSTATUS_CONFIG, or --config)\n    \
             <project>/.claude/ccstatus.yaml\n    \
             <project>/.claude/ccstatus.local.yaml\n\
         \n\
         ENVIRONMENT:\n    \
             CCSTATUS_LOG        log filter for stderr (default: warn)\n    \
             CCSTATUS_DEBUG      same as --debug\n    \
             CCSTATUS_CACHE_DIR  cache directory\n    \
             CCSTATUS_NO_CACHE   disable the session cache\n    \
             NO_COLOR            disable colors\n\
         \n\
         EXAMPLE INPUT:\n{EXAMPLE_SESSION}\n",
        version = env!("CARGO_PKG_VERSION"),
    )
}

pub fn version_text() -> String {
    format!(
        "ccstatus {} ({}/{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
