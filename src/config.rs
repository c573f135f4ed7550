use anyhow::{Context, Result};
use std::time::Duration;

/// Runtime settings, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Base address of the classes/tasks API, without a trailing slash
    pub api_base_url: String,
    /// Serve the in-memory API under `/api` on this same server
    pub embed_backend: bool,
    pub render_wait: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse::<u16>()
            .context("Invalid PORT")?;
        let embed_backend = var("EMBED_BACKEND")
            .unwrap_or_else(|| "false".to_string())
            .parse::<bool>()
            .context("Invalid EMBED_BACKEND (use true or false)")?;
        let render_wait = var("RENDER_WAIT_MS")
            .unwrap_or_else(|| "5000".to_string())
            .parse::<u64>()
            .map(Duration::from_millis)
            .context("Invalid RENDER_WAIT_MS")?;

        let api_base_url = match var("API_BASE_URL") {
            Some(url) => url,
            None if embed_backend => format!("http://127.0.0.1:{}/api", port),
            None => anyhow::bail!("API_BASE_URL must be set (or EMBED_BACKEND=true)"),
        };
        let api_base_url = api_base_url.trim_end_matches('/').to_string();

        Ok(Self {
            host,
            port,
            api_base_url,
            embed_backend,
            render_wait,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("API_BASE_URL", "http://api.local:8080/")]).unwrap();
        assert_eq!(config.api_base_url, "http://api.local:8080");
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert!(!config.embed_backend);
        assert_eq!(config.render_wait, Duration::from_secs(5));
    }

    #[test]
    fn test_base_url_required_without_embedded_backend() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("API_BASE_URL"));
    }

    #[test]
    fn test_embedded_backend_defaults_base_url() {
        let config = config(&[("EMBED_BACKEND", "true"), ("PORT", "4000")]).unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:4000/api");
    }

    #[test]
    fn test_invalid_port() {
        let err = config(&[("API_BASE_URL", "http://x"), ("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid PORT");
    }
}
