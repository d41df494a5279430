//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - Browser launch
//! - Graceful exit handling

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use devtools_bridge::{Result, Session};
use tokio::process::Command;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Locations tried when `CHROME_BIN` is not set.
const CHROME_CANDIDATES: &[&str] = &[
    "/usr/bin/google-chrome-stable",
    "/usr/bin/google-chrome",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
];

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub no_wait: bool,
    pub headless: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            no_wait: args.iter().any(|a| a == "--no-wait"),
            headless: args.iter().any(|a| a == "--headless"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "devtools_bridge=debug"
    } else {
        "devtools_bridge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Get the Chrome binary from `$CHROME_BIN` or well-known locations.
pub fn chrome_binary() -> PathBuf {
    if let Some(path) = std::env::var_os("CHROME_BIN") {
        return PathBuf::from(path);
    }
    CHROME_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from("chromium"))
}

/// Launch a browser window showing `about:blank`.
pub async fn launch(args: &Args, width: u32, height: u32) -> Result<Session> {
    let profile = std::env::temp_dir().join(format!("devtools-bridge-demo-{}", std::process::id()));

    let mut command = Command::new(chrome_binary());
    command
        .arg(format!("--user-data-dir={}", profile.display()))
        .arg(format!("--window-size={width},{height}"))
        .args([
            "--no-first-run",
            "--no-default-browser-check",
            "--disable-extensions",
            "--remote-debugging-port=0",
        ]);
    if args.headless {
        command.arg("--headless=new");
    } else {
        command.arg("--app=about:blank");
    }
    command.arg("about:blank");

    Session::builder().spawn(command).await
}

/// Wait for the window to close, Ctrl+C, or skip if `--no-wait` is set.
pub async fn wait_for_exit(session: &Session, no_wait: bool) {
    if no_wait {
        println!("[--no-wait] Skipping wait");
        return;
    }

    println!("Close the window or press Ctrl+C to exit...");
    tokio::select! {
        reason = session.done() => println!("Window closed ({reason})"),
        _ = tokio::signal::ctrl_c() => {}
    }
}
