use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration for the bot and its user-mode session.
#[derive(Clone, Debug)]
pub struct Config {
    // Bot API
    pub telegram_bot_token: String,

    // MTProto user session
    pub telegram_api_id: i32,
    pub telegram_api_hash: String,
    pub user_session_file: PathBuf,

    // Storage
    pub archive_db_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (env in production, a map in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = required(&get, "TELEGRAM_BOT_TOKEN")?;

        let api_id_raw = required(&get, "TELEGRAM_API_ID")?;
        let telegram_api_id = api_id_raw.trim().parse::<i32>().map_err(|_| {
            Error::Config(format!(
                "TELEGRAM_API_ID must be an integer, got {api_id_raw:?}"
            ))
        })?;
        let telegram_api_hash = required(&get, "TELEGRAM_API_HASH")?;

        let user_session_file = get("USER_SESSION_FILE")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("mab-user.session"));
        let archive_db_path = get("ARCHIVE_DB_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp/mab-users.json"));

        Ok(Self {
            telegram_bot_token,
            telegram_api_id,
            telegram_api_hash,
            user_session_file,
            archive_db_path,
        })
    }
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key)
        .and_then(non_empty)
        .ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    #[test]
    fn loads_required_values_and_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_API_ID", " 42 "),
            ("TELEGRAM_API_HASH", "deadbeef"),
        ]))
        .unwrap();

        assert_eq!(cfg.telegram_api_id, 42);
        assert_eq!(cfg.user_session_file, PathBuf::from("mab-user.session"));
        assert_eq!(cfg.archive_db_path, PathBuf::from("/tmp/mab-users.json"));
    }

    #[test]
    fn missing_or_blank_required_value_is_config_error() {
        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_API_ID", "42"),
            ("TELEGRAM_API_HASH", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_API_HASH"));

        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_API_ID", "not-a-number"),
            ("TELEGRAM_API_HASH", "h"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn dotenv_parsing_strips_quotes_and_comments() {
        let parsed = parse_dotenv("# comment\nA=1\nB=\"two words\"\n\nC='x'\n=skip\nnoequals\n");
        assert_eq!(
            parsed,
            vec![
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "two words".to_string()),
                ("C".to_string(), "x".to_string()),
            ]
        );
    }
}
