use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_QUEUE_DEPTH: usize = 64;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub cors_allowed_origins: Vec<String>,
    /// Board document loaded at startup; the demo board is used when unset.
    pub board_file: Option<PathBuf>,
    pub queue_depth: usize,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        let board_file = lookup("PIPELINE_BOARD_FILE")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        let queue_depth = match lookup("PIPELINE_QUEUE_DEPTH") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .context("invalid PIPELINE_QUEUE_DEPTH")?,
            None => DEFAULT_QUEUE_DEPTH,
        };
        if queue_depth == 0 {
            return Err(anyhow!("PIPELINE_QUEUE_DEPTH must be at least 1"));
        }

        Ok(Self {
            cors_allowed_origins,
            board_file,
            queue_depth,
        })
    }
}
