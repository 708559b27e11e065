use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// `KEY=value` pairs of a .env file. Blank lines and `#` comments are skipped,
/// a leading `export ` is dropped and matching surrounding quotes are removed.
pub fn parse_dot_env(contents: &str) -> Vec<(String, String)> {
    let mut out = vec![];
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, val)) = line.split_once('=') {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            out.push((key.to_string(), unquote(val.trim()).to_string()));
        }
    }
    out
}

fn unquote(val: &str) -> &str {
    for quote in ['"', '\''] {
        if val.len() >= 2 && val.starts_with(quote) && val.ends_with(quote) {
            return &val[1..val.len() - 1];
        }
    }
    val
}

/// exports the variables of the .env file at `path` into the process
/// environment. Variables that are already set win over the file. A missing
/// file is not an error, returns how many variables were set.
pub fn load_dot_env<P: AsRef<Path>>(path: P) -> Result<usize> {
    let path = path.as_ref();
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no .env file");
            return Ok(0);
        }
        Err(source) => return Err(Error::ReadFile { path: path.to_path_buf(), source }),
    };
    let mut set = 0;
    for (key, val) in parse_dot_env(&contents) {
        if std::env::var_os(&key).is_some() {
            debug!(key = key.as_str(), "already set, ignoring .env value");
            continue;
        }
        std::env::set_var(&key, val);
        set += 1;
    }
    debug!(path = %path.display(), set, "loaded .env file");
    Ok(set)
}
