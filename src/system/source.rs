//! Readers for the kernel-exposed accounting files.
//!
//! Every reader opens, reads and closes its file in one call and hands back
//! raw tokens. Nothing here interprets the numbers beyond tokenizing them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{SourceError, SourceResult};

/// Locations of every file the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcPaths {
    pub proc_root: PathBuf,
    pub os_release: PathBuf,
    pub passwd: PathBuf,
}

impl Default for ProcPaths {
    fn default() -> Self {
        ProcPaths {
            proc_root: PathBuf::from("/proc"),
            os_release: PathBuf::from("/etc/os-release"),
            passwd: PathBuf::from("/etc/passwd"),
        }
    }
}

impl ProcPaths {
    /// All paths resolved under a fake filesystem root (`<root>/proc`,
    /// `<root>/etc/os-release`, `<root>/etc/passwd`).
    pub fn rooted_at(root: &Path) -> Self {
        ProcPaths {
            proc_root: root.join("proc"),
            os_release: root.join("etc").join("os-release"),
            passwd: root.join("etc").join("passwd"),
        }
    }

    pub fn stat(&self) -> PathBuf {
        self.proc_root.join("stat")
    }

    pub fn meminfo(&self) -> PathBuf {
        self.proc_root.join("meminfo")
    }

    pub fn uptime(&self) -> PathBuf {
        self.proc_root.join("uptime")
    }

    pub fn version(&self) -> PathBuf {
        self.proc_root.join("version")
    }

    pub fn pid_dir(&self, pid: u32) -> PathBuf {
        self.proc_root.join(pid.to_string())
    }

    pub fn pid_stat(&self, pid: u32) -> PathBuf {
        self.pid_dir(pid).join("stat")
    }

    pub fn pid_status(&self, pid: u32) -> PathBuf {
        self.pid_dir(pid).join("status")
    }

    pub fn pid_cmdline(&self, pid: u32) -> PathBuf {
        self.pid_dir(pid).join("cmdline")
    }
}

/// Label → value pairs from one `KEY: VALUE [unit]` file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCounterSet {
    origin: PathBuf,
    entries: Vec<(String, String)>,
}

impl RawCounterSet {
    pub fn parse(origin: &Path, contents: &str) -> Self {
        let mut entries = Vec::new();
        for line in contents.lines() {
            let Some((key, rest)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim();
            // Only the value token is kept; a trailing unit such as "kB" is dropped.
            if let Some(value) = rest.split_whitespace().next()
                && !key.is_empty()
            {
                entries.push((key.to_string(), value.to_string()));
            }
        }
        RawCounterSet {
            origin: origin.to_path_buf(),
            entries,
        }
    }

    /// First value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Numeric value for `key`, failing with `MalformedLine` when the key is
    /// absent or its value is not an unsigned integer.
    pub fn number(&self, key: &str) -> SourceResult<u64> {
        let raw = self
            .get(key)
            .ok_or_else(|| SourceError::malformed(&self.origin, format!("missing `{key}`")))?;
        raw.parse().map_err(|_| {
            SourceError::malformed(&self.origin, format!("`{key}` is not numeric: {raw:?}"))
        })
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

pub fn read_file(path: &Path) -> SourceResult<String> {
    std::fs::read_to_string(path).map_err(|e| SourceError::unavailable(path, e))
}

/// Parse a `KEY: VALUE [unit]` file such as `meminfo` or `<pid>/status`.
pub fn read_keyed_file(path: &Path) -> SourceResult<RawCounterSet> {
    let contents = read_file(path)?;
    Ok(RawCounterSet::parse(path, &contents))
}

/// Tokens following the first token of the first line whose first token
/// satisfies `matches`. `None` when no line matches.
pub fn first_token_match(contents: &str, matches: impl Fn(&str) -> bool) -> Option<Vec<String>> {
    contents.lines().find_map(|line| {
        let mut tokens = line.split_whitespace();
        let first = tokens.next()?;
        matches(first).then(|| tokens.map(str::to_string).collect())
    })
}

pub fn read_first_token_match(
    path: &Path,
    matches: impl Fn(&str) -> bool,
) -> SourceResult<Option<Vec<String>>> {
    let contents = read_file(path)?;
    Ok(first_token_match(&contents, matches))
}

/// `PRETTY_NAME` from an os-release file, quotes stripped.
pub fn parse_os_release(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once('=')?;
        (key.trim() == "PRETTY_NAME").then(|| {
            value
                .trim()
                .trim_matches(|c| c == '"' || c == '\'')
                .to_string()
        })
    })
}

pub fn read_os_name(path: &Path) -> SourceResult<Option<String>> {
    let contents = read_file(path)?;
    Ok(parse_os_release(&contents))
}

/// Version token of a `Linux version X.Y.Z ...` banner.
pub fn parse_kernel_version(contents: &str) -> Option<String> {
    let line = contents.lines().next()?;
    line.split_whitespace().nth(2).map(str::to_string)
}

pub fn read_kernel_version(path: &Path) -> SourceResult<Option<String>> {
    let contents = read_file(path)?;
    Ok(parse_kernel_version(&contents))
}

/// Seconds since boot, the first token of the uptime file.
pub fn read_uptime(path: &Path) -> SourceResult<f64> {
    let contents = read_file(path)?;
    let token = contents
        .split_whitespace()
        .next()
        .ok_or_else(|| SourceError::malformed(path, "empty uptime file"))?;
    let secs: f64 = token
        .parse()
        .map_err(|_| SourceError::malformed(path, format!("uptime is not numeric: {token:?}")))?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(SourceError::malformed(
            path,
            format!("uptime out of range: {secs}"),
        ));
    }
    Ok(secs)
}

/// NUL-separated argv joined with single spaces. Empty for kernel threads.
pub fn read_cmdline(path: &Path) -> SourceResult<String> {
    let bytes = std::fs::read(path).map_err(|e| SourceError::unavailable(path, e))?;
    Ok(bytes
        .split(|&b| b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| String::from_utf8_lossy(arg).into_owned())
        .collect::<Vec<_>>()
        .join(" "))
}
