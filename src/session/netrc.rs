//! `~/.netrc` lookup, so passwords need not appear on the command line.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::url::Credentials;

/// Default location: `$HOME/.netrc`.
pub fn netrc_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".netrc"))
}

/// Credentials for `host` from the netrc file at `path`.
///
/// A missing or unreadable file yields `None`.
pub fn lookup(path: &Path, host: &str) -> Option<Credentials> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "No usable netrc file");
            return None;
        }
    };
    find_machine(&contents, host)
}

/// Parse netrc `contents` and return the entry for `host`, else the `default` entry.
pub fn find_machine(contents: &str, host: &str) -> Option<Credentials> {
    #[derive(Default)]
    struct Entry {
        login: Option<String>,
        password: Option<String>,
    }

    let mut matched: Option<Entry> = None;
    let mut default: Option<Entry> = None;
    // Which entry the current tokens belong to: Some(true) = our host,
    // Some(false) = the default entry, None = some other machine
    let mut target: Option<bool> = None;

    let mut tokens = contents.split_whitespace();
    while let Some(token) = tokens.next() {
        match token {
            "machine" => {
                if matched.is_some() {
                    break;
                }
                target = match tokens.next() {
                    Some(name) if name.eq_ignore_ascii_case(host) => {
                        matched = Some(Entry::default());
                        Some(true)
                    }
                    _ => None,
                };
            }
            "default" => {
                if matched.is_some() {
                    break;
                }
                default = Some(Entry::default());
                target = Some(false);
            }
            "login" | "password" => {
                let value = tokens.next().map(str::to_string);
                let entry = match target {
                    Some(true) => matched.as_mut(),
                    Some(false) => default.as_mut(),
                    None => None,
                };
                if let Some(entry) = entry {
                    if token == "login" {
                        entry.login = value;
                    } else {
                        entry.password = value;
                    }
                }
            }
            // Macro bodies and unknown tokens are ignored
            _ => {}
        }
    }

    let entry = matched.or(default)?;
    Some(Credentials {
        username: entry.login?,
        password: entry.password.unwrap_or_default(),
    })
}
