//! Two-way bridge demonstration.
//!
//! Demonstrates:
//! - Loading inline HTML
//! - Evaluating expressions and decoding results
//! - Exposing a Rust function to the page
//!
//! Usage:
//!   cargo run --example hello
//!   cargo run --example hello -- --headless --no-wait
//!   cargo run --example hello -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use common::Args;
use devtools_bridge::html_data_url;
use serde::Deserialize;

// ============================================================================
// Constants
// ============================================================================

const PAGE: &str = r#"<html>
<head><title>Hello</title></head>
<body>
	<h1>Hello from Rust</h1>
	<p id="sum"></p>
</body>
</html>"#;

#[derive(Debug, Deserialize)]
struct Viewport {
    width: u32,
    height: u32,
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Hello ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    println!("[Setup] Launching browser...");
    let session = common::launch(&args, 480, 320).await?;
    println!("        ✓ Session ready (pid={:?})\n", session.pid());

    session
        .bind("add", |call| async move {
            call.expect_len(2)?;
            Ok(call.arg::<f64>(0)? + call.arg::<f64>(1)?)
        })
        .await?;

    session
        .load_and_wait(&html_data_url(PAGE), Duration::from_secs(10))
        .await?;

    // ========================================================================
    // Host -> page
    // ========================================================================

    println!("[1] Evaluate: document.title");
    let title = session.evaluate("document.title").await?;
    println!("    Result: {title}\n");

    println!("[2] Evaluate and decode the viewport");
    let viewport: Viewport = session
        .evaluate_as("({width: window.innerWidth, height: window.innerHeight})")
        .await?;
    println!("    Result: {}x{}\n", viewport.width, viewport.height);

    // ========================================================================
    // Page -> host
    // ========================================================================

    println!("[3] Page calls Rust: add(2, 3)");
    let sum = session
        .evaluate(
            "window.add(2, 3).then(sum => (document.getElementById('sum').innerText = '2 + 3 = ' + sum, sum))",
        )
        .await?;
    println!("    Result: {sum}\n");

    println!("[4] Page calls Rust with a bad argument");
    let rejected = session
        .evaluate("window.add('two', 3).catch(e => e.message)")
        .await?;
    println!("    Result: {rejected}\n");

    common::wait_for_exit(&session, args.no_wait).await;
    session.kill().await;
    Ok(())
}
