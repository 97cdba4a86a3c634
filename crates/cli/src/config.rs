//! `console.toml` loading.
//!
//! Every field is optional; a missing file means defaults. The server URL
//! from `--server` / `MAESTRO_SERVER_URL` overrides whatever the file says.

use std::path::Path;

use anyhow::Context;
use maestro_session::SessionConfig;

use crate::paths::DataDir;

pub fn load(data_dir: &DataDir, server_override: Option<&str>) -> anyhow::Result<SessionConfig> {
    let mut config = load_file(&data_dir.config_path())?;
    if let Some(url) = server_override.map(str::trim).filter(|u| !u.is_empty()) {
        config.server_url = url.trim_end_matches('/').to_string();
    }
    tracing::debug!(
        component = "config",
        event = "config.loaded",
        server_url = %config.server_url,
        stream_url = %config.resolved_stream_url(),
        agents = config.agents.len(),
    );
    Ok(config)
}

fn load_file(path: &Path) -> anyhow::Result<SessionConfig> {
    if !path.exists() {
        return Ok(SessionConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config in {}", path.display()))
}
