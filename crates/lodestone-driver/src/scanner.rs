//! Candidate port discovery.
//!
//! A scan lists the entries of one directory and keeps the names matching
//! any of a set of glob-style patterns. That is deliberately all it does:
//! deciding whether a matched path is actually a reader is the session's
//! job — it opens the port and either hears the protocol or keeps retrying.

use std::io;
use std::path::PathBuf;

use tracing::debug;

use lodestone_core::{
    DevicePath,
    constants::{DEFAULT_DISCOVERY_ROOT, DEFAULT_PORT_PATTERNS},
};

/// Where to look for reader ports and what their names look like.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Directory whose entries are matched.
    pub root: PathBuf,
    /// Glob-style filename patterns (`*` and `?` wildcards).
    pub patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            root: PathBuf::from(DEFAULT_DISCOVERY_ROOT),
            patterns: DEFAULT_PORT_PATTERNS
                .iter()
                .map(|pattern| (*pattern).to_string())
                .collect(),
        }
    }
}

/// List the device paths under `config.root` whose file names match any
/// configured pattern, sorted for deterministic adoption order.
///
/// # Errors
/// Any I/O error from reading the directory; the controller logs it and
/// scans again on the next tick.
pub async fn scan_ports(config: &DiscoveryConfig) -> io::Result<Vec<DevicePath>> {
    let mut matches = Vec::new();
    let mut entries = tokio::fs::read_dir(&config.root).await?;
    while let Some(entry) = entries.next_entry().await? {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !config
            .patterns
            .iter()
            .any(|pattern| wildcard_match(pattern, name))
        {
            continue;
        }
        let Some(full) = config.root.join(name).to_str().map(str::to_string) else {
            continue;
        };
        match DevicePath::new(full) {
            Ok(path) => matches.push(path),
            Err(error) => debug!(name, %error, "skipping unusable directory entry"),
        }
    }
    matches.sort();
    Ok(matches)
}

/// Match `name` against a glob-style `pattern` where `*` matches any run of
/// characters (including none) and `?` matches exactly one.
///
/// Matching is case-sensitive; device nodes are.
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    let mut p = 0;
    let mut n = 0;
    // Position of the last `*` and the name index it was tried at, for
    // backtracking when a greedy match runs aground.
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, n));
            p += 1;
        } else if let Some((star_p, star_n)) = star {
            p = star_p + 1;
            n = star_n + 1;
            star = Some((star_p, star_n + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
