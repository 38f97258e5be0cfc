//! # cachectl - interactive shell over an element cache directory
//!
//! Reads commands from stdin, runs them against the cache, and prints
//! replies to stdout. Logs go to stderr so piped output stays clean.
//!
//! ## Commands
//!
//! ```text
//! CREATE                          Start a write pass (truncates the cache)
//! WAY id node...                  Store a way
//! REL id kind:id[:role]... [-- key=value...]
//!                                 Store a relation (kind is n, w or r)
//! COAST node way kind             Record a way endpoint
//!                                 (kind: coast, empty, coast-rev, empty-rev)
//! FINISH                          Flush every table and open it for reading
//! OPEN                            Open an existing cache for reading
//! GETWAY id                       Print the node ids of a way
//! GETREL id                       Print the members and tags of a relation
//! NODEREL id | WAYREL id          Print the relations containing a node/way
//! MAPPED node                     Print the ways ending at a node
//! STATS                           Print table sizes
//! EXIT / QUIT                     Finish any open write pass and quit
//! ```
//!
//! ## Configuration
//!
//! ```text
//! OSMCACHE_DIR           Cache directory              (default: "data/cache")
//! OSMCACHE_FLUSH_ENTRIES Buffered entries per table   (default: 1024)
//! RUST_LOG               Log filter                   (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ OSMCACHE_DIR=/tmp/cache cargo run -p cli
//! cachectl (dir=/tmp/cache, flush=1024)
//! > CREATE
//! OK
//! > WAY 10 1 2 3
//! OK
//! > FINISH
//! OK
//! > GETWAY 10
//! 1 2 3
//! > EXIT
//! bye
//! ```

mod shell;

use anyhow::Result;
use config::CacheConfig;
use shell::{Flow, Shell};
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cfg = CacheConfig::from_env();
    tracing::debug!(?cfg, "configuration loaded");

    let mut shell = Shell::new(cfg);
    println!(
        "cachectl (dir={}, flush={})",
        shell.config().dir.display(),
        shell.config().flush_threshold
    );
    println!("Commands: CREATE | WAY | REL | COAST | FINISH | OPEN");
    println!("          GETWAY | GETREL | NODEREL | WAYREL | MAPPED | STATS | EXIT");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "> ")?;
    out.flush()?;

    for line in io::stdin().lock().lines() {
        let line = line?;
        if shell.execute(&line, &mut out)? == Flow::Exit {
            return Ok(());
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    // stdin closed without EXIT
    shell.execute("EXIT", &mut out)?;
    Ok(())
}
