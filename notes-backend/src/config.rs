use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    /// File backing the local key-value cache
    pub const CACHE_PATH: &str = "NOTES_CACHE_PATH";
    /// Folder to use as the workspace at boot (optional)
    pub const WORKSPACE_DIR: &str = "NOTES_WORKSPACE_DIR";
    /// Quiet period before an edited note is saved
    pub const SAVE_DEBOUNCE_MS: &str = "NOTES_SAVE_DEBOUNCE_MS";
    /// Built frontend to serve at `/` (optional)
    pub const FRONTEND_DIR: &str = "NOTES_FRONTEND_DIR";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const CACHE_PATH: &str = "./.notes/local-db.json";
    pub const SAVE_DEBOUNCE_MS: u64 = crate::notes::debounce::DEFAULT_SAVE_DELAY_MS;
}

/// Parse an optional raw value, falling back to `default` when it is absent
/// or malformed.
fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Invalid value {:?} for {}, using default", raw, name);
            default
        }),
        None => default,
    }
}

/// Read a non-empty environment variable
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub cache_path: PathBuf,
    pub workspace_dir: Option<PathBuf>,
    pub save_debounce_ms: u64,
    pub frontend_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: parse_or(env_vars::PORT, non_empty_var(env_vars::PORT), defaults::PORT),
            cache_path: non_empty_var(env_vars::CACHE_PATH)
                .unwrap_or_else(|| defaults::CACHE_PATH.to_string())
                .into(),
            workspace_dir: non_empty_var(env_vars::WORKSPACE_DIR).map(PathBuf::from),
            save_debounce_ms: parse_or(
                env_vars::SAVE_DEBOUNCE_MS,
                non_empty_var(env_vars::SAVE_DEBOUNCE_MS),
                defaults::SAVE_DEBOUNCE_MS,
            ),
            frontend_dir: non_empty_var(env_vars::FRONTEND_DIR).map(PathBuf::from),
        }
    }

    pub fn save_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.save_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or::<u16>("PORT", None, 8080), 8080);
        assert_eq!(parse_or::<u16>("PORT", Some(" 9000 ".into()), 8080), 9000);
        assert_eq!(parse_or::<u16>("PORT", Some("nope".into()), 8080), 8080);
        assert_eq!(parse_or::<u64>("DEBOUNCE", Some("250".into()), 600), 250);
    }
}
