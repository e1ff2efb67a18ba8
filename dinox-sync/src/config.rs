use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::sync::CheckpointStore;
use crate::sync::Settings;
use crate::sync::template::DEFAULT_TEMPLATE;

const DEFAULT_SIYUAN_URL: &str = "http://127.0.0.1:6806";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub settings: Settings,
    pub dinox_api_url: String,
    pub siyuan_api_url: String,
    pub siyuan_token: Option<String>,
    pub checkpoint_path: PathBuf,
}

impl AppConfig {
    /// Reads `DINOX_*` / `SIYUAN_*` variables. A missing token or notebook id
    /// is not an error here; the sync run reports it, so `--reset` still
    /// works on an unconfigured machine.
    pub fn from_env() -> anyhow::Result<Self> {
        let home = dirs::home_dir();
        Self::from_lookup(|name| std::env::var(name).ok(), home.as_deref())
    }

    fn from_lookup<L>(lookup: L, home: Option<&Path>) -> anyhow::Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let template = match non_empty(&lookup, "DINOX_TEMPLATE_FILE") {
            Some(value) => {
                let path = expand_with_home(&value, home)?;
                std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read template at {}", path.display()))?
            }
            None => DEFAULT_TEMPLATE.to_string(),
        };
        let checkpoint_path = match non_empty(&lookup, "DINOX_CHECKPOINT_FILE") {
            Some(value) => expand_with_home(&value, home)?,
            None => CheckpointStore::default_path().context("data directory is unavailable")?,
        };

        Ok(Self {
            settings: Settings {
                template,
                token: non_empty(&lookup, "DINOX_TOKEN").unwrap_or_default(),
                notebook_id: non_empty(&lookup, "DINOX_NOTEBOOK_ID").unwrap_or_default(),
                render_locally: read_bool(&lookup, "DINOX_RENDER_LOCAL", false),
            },
            dinox_api_url: non_empty(&lookup, "DINOX_API_URL")
                .unwrap_or_else(|| dinox_core::DEFAULT_BASE_URL.to_string()),
            siyuan_api_url: non_empty(&lookup, "SIYUAN_API_URL")
                .unwrap_or_else(|| DEFAULT_SIYUAN_URL.to_string()),
            siyuan_token: non_empty(&lookup, "SIYUAN_TOKEN"),
            checkpoint_path,
        })
    }
}

fn non_empty<L>(lookup: &L, name: &str) -> Option<String>
where
    L: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_bool<L>(lookup: &L, name: &str, default: bool) -> bool
where
    L: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| {
            matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
        .unwrap_or(default)
}

/// Expands a leading `~`; the home directory is only required when one is present.
fn expand_with_home(value: &str, home: Option<&Path>) -> anyhow::Result<PathBuf> {
    let rest = match value.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(value)),
    };
    let home = home.with_context(|| format!("home directory is unavailable to expand {value}"))?;
    Ok(if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    })
}
