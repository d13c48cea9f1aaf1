//! Server configuration: a `redis.conf`-style file, overlaid by CLI flags.
//!
//! Resolution order is flag > file > built-in default. The file format is the same tolerant
//! `key value` line format the reference server reads: blank lines and `#`-prefixed lines are
//! skipped, everything else is split on the first space.

use crate::persistence::FsyncPolicy;
use clap::Parser;
use std::collections::HashMap;
use std::path::Path;

#[derive(Parser, Debug)]
#[clap(name = "ferrokv-server", version, author, about = "A single-node, in-memory, RESP-compatible key/value store")]
pub struct Cli {
    /// Path to a redis.conf-style config file. Defaults to ./redis.conf if present.
    #[clap(long)]
    pub config: Option<String>,

    #[clap(long)]
    pub bind: Option<String>,

    #[clap(long)]
    pub port: Option<u16>,

    #[clap(long)]
    pub appendonly: Option<bool>,

    #[clap(long)]
    pub appendfilename: Option<String>,

    #[clap(long)]
    pub appendfsync: Option<String>,

    #[clap(long = "auto-aof-rewrite-after-cmds")]
    pub auto_aof_rewrite_after_cmds: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub appendonly: bool,
    pub appendfilename: String,
    pub appendfsync: FsyncPolicy,
    pub auto_aof_rewrite_after_cmds: u64,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            bind: "0.0.0.0".to_string(),
            port: crate::DEFAULT_PORT,
            appendonly: false,
            appendfilename: "appendonly.aof".to_string(),
            appendfsync: FsyncPolicy::EverySec,
            auto_aof_rewrite_after_cmds: 10_000,
        }
    }
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }

    /// Resolves the config file (explicit path, or `./redis.conf` if present, or the built-in
    /// default), then overlays any CLI flags the caller actually set.
    pub fn resolve(cli: &Cli) -> std::io::Result<Config> {
        let mut config = match &cli.config {
            Some(path) => Config::from_file(Path::new(path))?,
            None => {
                let default_path = Path::new("./redis.conf");
                if default_path.exists() {
                    Config::from_file(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        if let Some(bind) = &cli.bind {
            config.bind = bind.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(appendonly) = cli.appendonly {
            config.appendonly = appendonly;
        }
        if let Some(name) = &cli.appendfilename {
            config.appendfilename = name.clone();
        }
        if let Some(raw) = &cli.appendfsync {
            if let Some(policy) = parse_fsync(raw) {
                config.appendfsync = policy;
            }
        }
        if let Some(n) = cli.auto_aof_rewrite_after_cmds {
            config.auto_aof_rewrite_after_cmds = n;
        }

        Ok(config)
    }

    fn from_file(path: &Path) -> std::io::Result<Config> {
        let raw = std::fs::read_to_string(path)?;
        let kv = parse_lines(&raw);
        let mut config = Config::default();

        if let Some(v) = kv.get("bind") {
            config.bind = v.clone();
        }
        if let Some(v) = kv.get("port") {
            if let Ok(p) = v.parse() {
                config.port = p;
            }
        }
        if let Some(v) = kv.get("appendonly") {
            config.appendonly = v == "yes";
        }
        if let Some(v) = kv.get("appendfilename") {
            config.appendfilename = v.clone();
        }
        if let Some(v) = kv.get("appendfsync") {
            if let Some(policy) = parse_fsync(v) {
                config.appendfsync = policy;
            }
        }
        if let Some(v) = kv.get("auto-aof-rewrite-after-cmds") {
            if let Ok(n) = v.parse() {
                config.auto_aof_rewrite_after_cmds = n;
            }
        }

        Ok(config)
    }
}

fn parse_lines(raw: &str) -> HashMap<String, String> {
    let mut kv = HashMap::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some(pivot) = trimmed.find(' ') else {
            continue;
        };
        if pivot == 0 || pivot >= trimmed.len() - 1 {
            continue;
        }
        let (key, value) = trimmed.split_at(pivot);
        kv.insert(key.to_string(), value[1..].trim().to_string());
    }
    kv
}

fn parse_fsync(s: &str) -> Option<FsyncPolicy> {
    match s {
        "always" => Some(FsyncPolicy::Always),
        "everysec" => Some(FsyncPolicy::EverySec),
        "no" => Some(FsyncPolicy::No),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_file() {
        let raw = "# comment\nbind 127.0.0.1\nport 7000\nappendonly yes\n";
        let kv = parse_lines(raw);
        assert_eq!(kv.get("bind").unwrap(), "127.0.0.1");
        assert_eq!(kv.get("port").unwrap(), "7000");
        assert_eq!(kv.get("appendonly").unwrap(), "yes");
    }

    #[test]
    fn ignores_malformed_lines() {
        let raw = "justaword\n bind\n";
        assert!(parse_lines(raw).is_empty());
    }

    #[test]
    fn unknown_fsync_value_is_ignored() {
        assert!(parse_fsync("whenever").is_none());
    }
}
