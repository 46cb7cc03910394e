use anyhow::{Result, bail};

use crate::client::ClientConfig;

pub const DEFAULT_API_URL: &str = "https://api.roboflow.com";

/// Environment variable holding the private API key.
pub const API_KEY_ENV: &str = "ROBOFLOW_API_KEY";

const API_URL_ENVS: [&str; 2] = ["ROBOFLOW_API_URL", "API_URL"];

pub(crate) fn load_config(key: String, url: Option<String>) -> Result<ClientConfig> {
    resolve_config(key, url, |name| std::env::var(name).ok())
}

fn resolve_config<F>(key: String, url: Option<String>, env: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let url = url
        .or_else(|| {
            API_URL_ENVS
                .iter()
                .find_map(|name| env(name).filter(|v| !v.trim().is_empty()))
        })
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());

    if key.trim().is_empty() {
        bail!("Missing configuration: key (set {} or pass an API key)", API_KEY_ENV);
    }

    Ok(ClientConfig {
        url: url.trim().trim_end_matches('/').to_string(),
        key,
    })
}
