use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use ccstatus::app;
use ccstatus::cache::new_cache;
use ccstatus::cli::{Action, Args, help_text, version_text};
use ccstatus::config::Reader;
use ccstatus::core::Registry;
use ccstatus::logging;
use ccstatus::models::ClaudeSession;
use ccstatus::utils::read_stdin;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    match args.action() {
        Action::Help => return print(&help_text()),
        Action::Version => return print(&format!("{}\n", version_text())),
        Action::Render => {}
    }

    let stdin = read_stdin().unwrap_or_default();
    if stdin.iter().all(u8::is_ascii_whitespace) {
        return print(&help_text());
    }
    let session = match ClaudeSession::from_slice(&stdin) {
        Ok(session) => Arc::new(session),
        Err(e) => {
            debug!(error = %e, "stdin is not a session payload");
            return print(&help_text());
        }
    };

    let config = Arc::new(Reader::load(
        session.project_dir().map(Path::new),
        args.config.as_deref(),
    ));
    debug!(sources = ?config.sources(), "configuration loaded");

    let cache = new_cache(&config, &session.session_id);
    let registry = Registry::builtin();
    let line = app::render(&registry, &config, &session, &cache);

    if let Err(e) = cache.close() {
        debug!(error = %e, "session cache not saved");
    }

    print(&line)
}

fn print(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|()| stdout.flush())
        .context("write status line to stdout")
}
