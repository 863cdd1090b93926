use std::{env, fs, path::Path};

use crate::{errors::Error, Result};

/// Typed configuration loaded from the environment (and `.env`, if present).
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub bot_name: String,

    // Dispatch
    pub max_concurrent_handlers: usize,
    pub max_redirects: usize,

    // Users
    pub default_lang: String,
    pub default_page_size: u32,

    // Tokens
    pub consume_tokens: bool,
}

pub const DEFAULT_MAX_CONCURRENT_HANDLERS: usize = 4;

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        // Required env vars
        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }
        let bot_name = env_str("BOT_NAME")
            .and_then(non_empty)
            .map(|s| s.trim().trim_start_matches('@').to_string())
            .ok_or_else(|| Error::Config("BOT_NAME environment variable is required".to_string()))?;

        // Dispatch bounds
        let max_concurrent_handlers = env_usize("MAX_CONCURRENT_HANDLERS")
            .unwrap_or(DEFAULT_MAX_CONCURRENT_HANDLERS)
            .max(1);
        let max_redirects = env_usize("MAX_REDIRECTS").unwrap_or(3);

        // User defaults
        let default_lang = env_str("DEFAULT_LANG")
            .and_then(non_empty)
            .unwrap_or_else(|| "en".to_string());
        let default_page_size = env_u32("DEFAULT_PAGE_SIZE").unwrap_or(5).max(1);

        let consume_tokens = env_bool("CONSUME_TOKENS").unwrap_or(true);

        Ok(Self {
            telegram_bot_token,
            bot_name,
            max_concurrent_handlers,
            max_redirects,
            default_lang,
            default_page_size,
            consume_tokens,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
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

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|s| parse_bool(&s))
}

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
