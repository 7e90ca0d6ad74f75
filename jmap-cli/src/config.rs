// jmap-cli/src/config.rs
use anyhow::{anyhow, bail, Result};
use directories::BaseDirs;
use jmap_rpc::{Client, ReqwestClient};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Session resource, eg `https://api.example.com/.well-known/jmap`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_url: Option<String>,
    /// Used for SRV discovery when no session URL is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Bearer token; takes precedence over username and password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Config {
    /// Loads the config file, creating a default one if missing, then applies
    /// `JMAP_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = config_dir.join("config.toml");

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            let default = Self::default();
            default.save()?;
            default
        };

        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("JMAP_SESSION_URL") {
            self.server.session_url = Some(url);
        }
        if let Some(domain) = var("JMAP_DOMAIN") {
            self.server.domain = Some(domain);
        }
        if let Some(token) = var("JMAP_TOKEN") {
            self.auth.token = Some(token);
        }
        if let Some(username) = var("JMAP_USERNAME") {
            self.auth.username = Some(username);
        }
        if let Some(password) = var("JMAP_PASSWORD") {
            self.auth.password = Some(password);
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir)?;
        self.save_to(&config_dir.join("config.toml"))
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;

        // Set permissions to 600 (owner read/write only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(config_path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(config_path, perms)?;
        }

        Ok(())
    }

    fn config_dir() -> Result<PathBuf> {
        let base_dirs =
            BaseDirs::new().ok_or_else(|| anyhow!("Cannot determine config directory"))?;
        Ok(base_dirs.config_dir().join("jmap-cli"))
    }

    /// HTTP client carrying the configured credentials.
    pub fn http_client(&self) -> Result<ReqwestClient> {
        let http = ReqwestClient::new();
        match (&self.auth.token, &self.auth.username, &self.auth.password) {
            (Some(token), _, _) => Ok(http.with_token(token.clone())),
            (None, Some(username), Some(password)) => {
                Ok(http.with_basic_auth(username.clone(), password.clone()))
            }
            _ => bail!("No credentials configured. Run `jmap setup` or set JMAP_TOKEN"),
        }
    }

    /// A client for the configured session URL, or for the domain's SRV
    /// record when only a domain is set.
    pub async fn client(&self) -> Result<Client<ReqwestClient>> {
        let http = self.http_client()?;
        if let Some(url) = &self.server.session_url {
            return Ok(Client::new(http).with_session_endpoint(url.clone()));
        }
        if let Some(domain) = &self.server.domain {
            return Ok(Client::new(http).discover(domain).await?);
        }
        bail!("No server configured. Set JMAP_SESSION_URL, JMAP_DOMAIN or pass --session-url")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_sections() {
        let config: Config = toml::from_str(
            r#"
            [server]
            session_url = "https://api.example.com/.well-known/jmap"

            [auth]
            token = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.server.session_url.as_deref(),
            Some("https://api.example.com/.well-known/jmap")
        );
        assert_eq!(config.auth.token.as_deref(), Some("secret"));
        assert!(config.server.domain.is_none());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("JMAP_DOMAIN", "example.com"),
            ("JMAP_USERNAME", "john"),
            ("JMAP_PASSWORD", "hunter2"),
        ]);
        let mut config = Config {
            server: ServerConfig {
                session_url: Some("https://old.example.com/".to_string()),
                domain: None,
            },
            ..Default::default()
        };
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.server.domain.as_deref(), Some("example.com"));
        assert_eq!(
            config.server.session_url.as_deref(),
            Some("https://old.example.com/")
        );
        assert_eq!(config.auth.username.as_deref(), Some("john"));
        assert!(config.http_client().is_ok());
    }

    #[test]
    fn test_missing_credentials() {
        let config = Config::default();
        assert!(config.http_client().is_err());
    }

    #[test]
    fn test_save_round_trip() {
        let path = std::env::temp_dir().join(format!("jmap-cli-test-{}.toml", std::process::id()));
        let config = Config {
            auth: AuthConfig {
                token: Some("secret".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
