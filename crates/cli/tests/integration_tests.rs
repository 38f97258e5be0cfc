/// End-to-end tests for the cachectl binary.
/// Each test drives the shell over stdin against a fresh cache directory.
use std::path::Path;
use tempfile::tempdir;

/// Runs the binary with `commands` on stdin (followed by EXIT) and returns stdout.
fn run_cli(dir: &Path, flush_entries: &str, commands: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new(env!("CARGO_BIN_EXE_cachectl"))
        .env("OSMCACHE_DIR", dir)
        .env("OSMCACHE_FLUSH_ENTRIES", flush_entries)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn cachectl");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(commands.as_bytes())
            .expect("Failed to write commands");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_write_then_query_in_one_session() {
    let dir = tempdir().unwrap();
    let out = run_cli(
        dir.path(),
        "1024",
        "CREATE\nWAY 10 1 2 3\nWAY 11 3 4 1\nFINISH\nGETWAY 10\nGETWAY 99\n",
    );

    assert!(out.contains("cachectl (dir="));
    assert!(out.contains("1 2 3"));
    assert!(out.contains("(nil)"));
    assert!(out.contains("bye"));
    assert!(!out.contains("ERR"));
}

#[test]
fn test_cache_survives_restart() {
    let dir = tempdir().unwrap();
    run_cli(
        dir.path(),
        "2",
        "CREATE\n\
         WAY 1 100 101\nWAY 2 101 102\nWAY 3 102 100\n\
         REL 50 w:1:outer w:2:outer w:3:outer -- type=multipolygon\n\
         REL 51 n:101 w:2 -- type=route\n\
         COAST 100 1 coast\nCOAST 100 3 coast-rev\n\
         FINISH\n",
    );
    assert!(dir.path().join("ways.dat.offs").exists());
    assert!(dir.path().join("mapped_ways.n2w").exists());

    let out = run_cli(
        dir.path(),
        "2",
        "OPEN\nGETWAY 3\nWAYREL 2\nNODEREL 101\nMAPPED 100\nGETREL 51\nSTATS\n",
    );
    assert!(out.contains("102 100"));
    assert!(out.contains("50 51"));
    assert!(out.contains("1 coast\n"));
    assert!(out.contains("3 coast-rev\n"));
    assert!(out.contains("n:101:\n"));
    assert!(out.contains("type=route"));
    assert!(out.contains("ways=3 relations=2 node_links=1 way_links=4 mapped_ways=2"));
}

#[test]
fn test_exit_without_finish_keeps_data() {
    let dir = tempdir().unwrap();
    run_cli(dir.path(), "1024", "CREATE\nWAY 5 7 8 9\n");

    let out = run_cli(dir.path(), "1024", "OPEN\nGETWAY 5\n");
    assert!(out.contains("7 8 9"));
}

#[test]
fn test_open_missing_cache_reports_error() {
    let dir = tempdir().unwrap();
    let out = run_cli(&dir.path().join("nowhere"), "1024", "OPEN\nGETWAY 1\n");

    assert!(out.contains("ERR open:"));
    assert!(out.contains("ERR getway:"));
    assert!(out.contains("bye"));
}

#[test]
fn test_unknown_command() {
    let dir = tempdir().unwrap();
    let out = run_cli(dir.path(), "1024", "HELLO\n");
    assert!(out.contains("ERR hello: unknown command HELLO"));
}
