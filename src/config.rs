// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use tracing::debug;

/// Environment variable consulted when no config path is given explicitly.
pub const CONFIG_ENV: &str = "BICIMAD_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub emt: EmtConfig,
    pub http: HttpConfig,
}

/// Where the open-data portal lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmtConfig {
    pub base_url: String,
    pub index_path: String,
}

impl Default for EmtConfig {
    fn default() -> Self {
        Self {
            base_url: "https://opendata.emtmadrid.es/".into(),
            index_path: "/Datos-estaticos/Datos-generales-(1)".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Upper bound for each HEAD probe of a candidate archive.
    pub probe_timeout_secs: u64,
    /// Upper bound for the index page fetch and archive downloads.
    pub request_timeout_secs: u64,
    /// How many probes may be in flight at once.
    pub probe_concurrency: usize,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            probe_timeout_secs: 20,
            request_timeout_secs: 120,
            probe_concurrency: 8,
            user_agent: concat!("bicimad/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl HttpConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl EmtConfig {
    /// Joins the portal base with a site-absolute path, avoiding a doubled `/`.
    pub fn absolute(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn index_url(&self) -> String {
        self.absolute(&self.index_path)
    }
}

impl Config {
    /// Read a YAML config file. Missing keys fall back to defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let cfg: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(cfg)
    }

    /// Explicit path first, then `$BICIMAD_CONFIG`, then built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(p) => Self::from_file(p),
                None => Ok(Self::default()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_point_at_emt() {
        let cfg = Config::default();
        assert_eq!(
            cfg.emt.index_url(),
            "https://opendata.emtmadrid.es/Datos-estaticos/Datos-generales-(1)"
        );
        assert_eq!(cfg.http.probe_timeout(), Duration::from_secs(20));
        assert_eq!(
            cfg.emt.absolute("/getattachment/x/trips_22_01_January-csv.aspx"),
            "https://opendata.emtmadrid.es/getattachment/x/trips_22_01_January-csv.aspx"
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "http:\n  probe_concurrency: 2\n  probe_timeout_secs: 5")?;

        let cfg = Config::from_file(tmp.path())?;
        assert_eq!(cfg.http.probe_concurrency, 2);
        assert_eq!(cfg.http.probe_timeout_secs, 5);
        assert_eq!(cfg.http.request_timeout_secs, 120);
        assert_eq!(cfg.emt, EmtConfig::default());
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(Config::from_file("/definitely/not/here.yaml").is_err());
    }
}
