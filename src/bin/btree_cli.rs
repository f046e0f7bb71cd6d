//! Simple CLI for exercising the B+ tree.
//!
//! Usage:
//!   btree_cli [--branching-factor <n>] [--config-json <json>]
//!
//! Commands are read from stdin, one per line:
//!   put <key> <value>
//!   get <key>
//!   delete <key>
//!   scan [start] [end]
//!   stats
//!   dump
//!   debug <key>
//!   bulk_insert <count>
//!   clear

use bplus_tree::{Db, Result, TreeConfig, TreeError};
use std::env;
use std::io::{self, BufRead, Write};
use std::process::exit;

fn parse_config(args: &[String]) -> Result<TreeConfig> {
    let mut config = TreeConfig::default();
    let mut args = args.iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--branching-factor" | "-b" => {
                let value = args
                    .next()
                    .ok_or_else(|| TreeError::InvalidConfig(format!("{} needs a value", arg)))?;
                let branching_factor = value
                    .parse()
                    .map_err(|_| TreeError::InvalidConfig(format!("invalid branching factor: {}", value)))?;
                config = TreeConfig::new(branching_factor);
            }
            "--config-json" => {
                let value = args
                    .next()
                    .ok_or_else(|| TreeError::InvalidConfig(format!("{} needs a value", arg)))?;
                config = TreeConfig::from_json(value)?;
            }
            other => return Err(TreeError::InvalidConfig(format!("unknown argument: {}", other))),
        }
    }
    Ok(config)
}

fn print_usage() {
    eprintln!("Commands:");
    eprintln!("  put <key> <value>   - Insert or update a key-value pair");
    eprintln!("  get <key>           - Get value for a key");
    eprintln!("  delete <key>        - Delete a key");
    eprintln!("  scan [start] [end]  - Scan keys in range (inclusive)");
    eprintln!("  stats               - Show tree statistics");
    eprintln!("  dump                - Print every node");
    eprintln!("  debug <key>         - Trace the lookup of a key");
    eprintln!("  bulk_insert <count> - Insert count test records");
    eprintln!("  clear               - Remove every key");
}

/// Run one command line against the database
fn execute(db: &Db, line: &str, out: &mut impl Write) -> io::Result<()> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return Ok(());
    };

    match (command, args) {
        ("put", [key, value]) => {
            db.put(key.as_bytes(), value.as_bytes());
            writeln!(out, "OK")
        }

        ("get", [key]) => match db.get(key.as_bytes()) {
            Some(value) => match String::from_utf8(value) {
                Ok(s) => writeln!(out, "{}", s),
                Err(_) => writeln!(out, "<binary data>"),
            },
            None => writeln!(out, "NOT_FOUND"),
        },

        ("delete", [key]) => {
            if db.delete(key.as_bytes()) {
                writeln!(out, "DELETED")
            } else {
                writeln!(out, "NOT_FOUND")
            }
        }

        ("scan", bounds) if bounds.len() <= 2 => {
            let start = bounds.first().map(|s| s.as_bytes());
            let end = bounds.get(1).map(|s| s.as_bytes());
            let results = db.range(start, end);
            writeln!(out, "COUNT: {}", results.len())?;
            for (key, value) in results {
                let key_str = String::from_utf8_lossy(&key);
                let value_str = String::from_utf8_lossy(&value);
                writeln!(out, "{} -> {}", key_str, value_str)?;
            }
            Ok(())
        }

        ("stats", []) => {
            let stats = db.stats();
            writeln!(out, "len: {}", stats.len)?;
            writeln!(out, "height: {}", stats.height)?;
            writeln!(out, "node_count: {}", stats.node_count)?;
            writeln!(out, "leaf_count: {}", stats.leaf_count)?;
            writeln!(out, "internal_count: {}", stats.internal_count)?;
            writeln!(out, "underflow_nodes: {}", stats.underflow_nodes)?;
            writeln!(out, "branching_factor: {}", stats.branching_factor)
        }

        ("dump", []) => write!(out, "{}", db.dump()),

        ("debug", [key]) => {
            for line in db.debug_get(key.as_bytes()) {
                writeln!(out, "{}", line)?;
            }
            Ok(())
        }

        ("bulk_insert", [count]) => {
            let Ok(count) = count.parse::<usize>() else {
                return writeln!(out, "ERROR: Invalid count");
            };

            let start = std::time::Instant::now();
            for i in 0..count {
                let key = format!("key_{:08}", i);
                let value = format!("value_{}", i);
                db.put(key.as_bytes(), value.as_bytes());
            }
            let elapsed = start.elapsed();

            let ops_per_sec = count as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
            writeln!(out, "INSERTED: {}", count)?;
            writeln!(out, "TIME_MS: {}", elapsed.as_millis())?;
            writeln!(out, "OPS_PER_SEC: {:.0}", ops_per_sec)
        }

        ("clear", []) => {
            db.clear();
            writeln!(out, "OK")
        }

        _ => writeln!(out, "ERROR: Unknown or malformed command: {}", line.trim()),
    }
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let config = match parse_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!("Usage: btree_cli [--branching-factor <n>] [--config-json <json>]");
            print_usage();
            exit(1);
        }
    };

    let db = Db::open(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let result = line.and_then(|line| execute(&db, &line, &mut out));
        if let Err(e) = result {
            eprintln!("ERROR: {}", e);
            exit(1);
        }
    }
}
