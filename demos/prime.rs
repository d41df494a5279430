//! Streaming results to a page callback.
//!
//! Demonstrates:
//! - Receiving a page function as a binding argument
//! - Calling it repeatedly from a background task
//! - Cancelling superseded jobs
//!
//! Type a number into the page; the primes are streamed back in chunks of
//! ten. A new number cancels the job that is still running.
//!
//! Usage:
//!   cargo run --example prime
//!   cargo run --example prime -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use common::Args;
use devtools_bridge::{Error, FunctionHandle, html_data_url};
use tokio::sync::mpsc;

// ============================================================================
// Constants
// ============================================================================

/// Primes sent to the page per callback invocation.
const CHUNK: usize = 10;

/// Largest request accepted from the page.
const MAX_PRIMES: usize = 100_000;

const PAGE: &str = r#"<html>
<title>Primes</title>
<div id="container" class="root">
	<div class="head">How many primes do you want? &nbsp; <input autofocus onkeyup="run(this)"/></div>
	<pre id="output"></pre>
</div>
<script>
let no = 1;
function println(msg, lineno) {
	const line = lineno ? (no++).toString().padStart(5, "0") + ": " : "";
	document.getElementById("output").innerText += line + msg + "\n";
}
function clear() {
	no = 1;
	document.getElementById("output").innerText = "";
}
let lastTimer;
let last = 0;
function run(e) {
	if (lastTimer) clearTimeout(lastTimer);
	lastTimer = setTimeout(() => {
		const count = e.value.length == 0 ? 0 : parseInt(e.value);
		if (!(count >= 0) || count == last) return;
		last = count;
		clear();
		const lineno = count > 10;
		js2go(count, (primes) => println(primes.join(" "), lineno));
	}, 10);
}
</script>
<style>
html, body { height: 100%; margin: 0; overflow: hidden; }
.root { height: 100%; overflow: scroll; }
.head { position: absolute; background: white; width: 600px; padding: 0.5em; }
pre { margin-top: 40px; padding-left: 0.5em; }
input { border-width: 0 0 1px 0; outline: none; text-align: center; width: 60px; }
</style>
</html>"#;

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
    let session = common::launch(&args, 800, 600).await?;

    // Incremented per request; a job stops once it is no longer current.
    let generation = Arc::new(AtomicU64::new(0));

    session
        .bind("js2go", move |call| {
            let generation = Arc::clone(&generation);
            async move {
                let count: usize = call.arg(0)?;
                if count > MAX_PRIMES {
                    return Err(Error::handler(format!("at most {MAX_PRIMES} primes")));
                }
                let callback = call.function(1)?;
                let job = generation.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::spawn(stream_primes(count, callback, job, generation));
                Ok(())
            }
        })
        .await?;

    session.load(&html_data_url(PAGE)).await?;

    common::wait_for_exit(&session, args.no_wait).await;
    session.kill().await;
    Ok(())
}

// ============================================================================
// Job
// ============================================================================

/// Sends the first `count` primes to `callback` in chunks.
async fn stream_primes(count: usize, callback: FunctionHandle, job: u64, generation: Arc<AtomicU64>) {
    let (tx, mut rx) = mpsc::channel(CHUNK);
    tokio::task::spawn_blocking(move || primes(count, &tx));

    let mut buffer = Vec::with_capacity(CHUNK);
    while let Some(prime) = rx.recv().await {
        if generation.load(Ordering::SeqCst) != job {
            break;
        }
        buffer.push(prime);
        if buffer.len() == CHUNK && flush(&callback, &mut buffer).await.is_err() {
            break;
        }
    }
    if !buffer.is_empty() && generation.load(Ordering::SeqCst) == job {
        let _ = flush(&callback, &mut buffer).await;
    }
    let _ = callback.release().await;
}

async fn flush(callback: &FunctionHandle, buffer: &mut Vec<u64>) -> devtools_bridge::Result<()> {
    callback.call((buffer.as_slice(),)).await?;
    buffer.clear();
    Ok(())
}

/// Produces the first `count` primes; stops early if the receiver is gone.
fn primes(count: usize, tx: &mpsc::Sender<u64>) {
    let mut found: Vec<u64> = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while found.len() < count {
        let is_prime = found
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0);
        if is_prime {
            if tx.blocking_send(candidate).is_err() {
                return;
            }
            found.push(candidate);
        }
        candidate += 1;
    }
}
