//! Site configuration (config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SiteError;

/// Main site configuration, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub url: String,
    pub host: String,
    pub port: u16,
    pub description: String,
    pub theme: String,
    #[serde(rename = "syntax_highlighting")]
    pub syntax: SyntaxHighlighting,
    pub nav: Vec<NavItem>,
    pub social: Vec<NavItem>,
    pub docs_path: PathBuf,
    pub public_path: PathBuf,
}

/// Light/dark syntax highlighting theme pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxHighlighting {
    pub dark_mode: ThemeConfig,
    pub light_mode: ThemeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub theme: String,
}

/// A navigation or social link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavItem {
    pub name: String,
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "some title".to_string(),
            url: "http://localhost:8080".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            description: String::new(),
            theme: "default".to_string(),
            syntax: SyntaxHighlighting {
                dark_mode: ThemeConfig {
                    theme: "base16-ocean.dark".to_string(),
                },
                light_mode: ThemeConfig {
                    theme: "InspiredGitHub".to_string(),
                },
            },
            nav: Vec::new(),
            social: Vec::new(),
            docs_path: PathBuf::new(),
            public_path: PathBuf::from("public"),
        }
    }
}

impl Config {
    /// Load the configuration, creating a default `config.yml` when none
    /// exists. Resolution order: explicit path, `./config.yml`, then the
    /// `SITE_CONFIG` environment variable.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match find_config_file() {
                Some(path) => path,
                None => {
                    let path = PathBuf::from("config.yml");
                    Config::default().write_to(&path)?;
                    tracing::info!(path = %path.display(), "created default config file");
                    path
                }
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: Config =
            serde_yaml::from_str(&content).context("failed to parse config yaml")?;

        if config.docs_path.as_os_str().is_empty() {
            config.docs_path = find_docs_dir()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Serialize this configuration to a YAML file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("failed to marshal default config")?;
        fs::write(path, content)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), SiteError> {
        if self.port == 0 {
            return Err(SiteError::Config("port must be non-zero".to_string()));
        }
        if self.url.trim().is_empty() {
            return Err(SiteError::Config("url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Address string for the TCP listener.
    pub fn listen_addr(&self) -> String {
        let host = if self.host == "localhost" {
            "127.0.0.1"
        } else {
            &self.host
        };
        format!("{}:{}", host, self.port)
    }
}

/// Locate an existing config file: `./config.yml` first, then `SITE_CONFIG`.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("config.yml");
    if local.exists() {
        return Some(local);
    }
    std::env::var_os("SITE_CONFIG")
        .map(PathBuf::from)
        .filter(|p| p.exists())
}

/// Locate the docs directory: `./docs`, the `DOCS_DIR` environment variable,
/// or a freshly created `./docs` with an empty index.
fn find_docs_dir() -> Result<PathBuf> {
    let local = PathBuf::from("docs");
    if local.exists() {
        return Ok(local);
    }

    if let Some(dir) = std::env::var_os("DOCS_DIR").map(PathBuf::from) {
        if dir.exists() {
            return Ok(dir);
        }
    }

    fs::create_dir_all(&local).context("failed to create docs directory")?;
    fs::write(local.join("README.md"), "").context("failed to create docs README.md")?;
    Ok(local)
}
