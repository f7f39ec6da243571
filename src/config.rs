use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use serde_yaml;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "markstash")]
#[command(about = "Runs the markstash bookmark service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".markstash")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct App {
    database: String,
    bucket: String,
    port: i32,
    #[serde(default)]
    pub turso_url: Option<String>,
    #[serde(default)]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
    #[serde(default = "default_signed_url_expiration")]
    pub signed_url_expiration_seconds: u64,
}

fn default_sync_interval() -> u64 {
    60
}

fn default_signed_url_expiration() -> u64 {
    300
}

#[derive(Debug, Deserialize, Default)]
pub struct Storage {
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub aws_endpoint_url_s3: String,
    pub aws_region: String,
    pub service: String,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Auth {
    #[serde(default)]
    jwt_secret: Option<String>,
}

impl App {
    pub fn get_db(&self) -> &str {
        return &self.database;
    }

    pub fn get_port(&self) -> i32 {
        return self.port;
    }

    pub fn get_bucket(&self) -> &str {
        return &self.bucket;
    }

    pub fn signed_url_expiration(&self) -> Duration {
        Duration::from_secs(self.signed_url_expiration_seconds)
    }
}

impl Auth {
    /// An empty secret (e.g. an unset `${VAR}`) counts as no secret.
    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
    pub storage: Storage,
    #[serde(default)]
    pub auth: Auth,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!("environment variable '{}' not found", var_name);
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
app:
  database: markstash.db
  bucket: markstash-attachments
  port: 8080
storage:
  aws_access_key_id: ${MARKSTASH_TEST_UNSET_KEY:-local-key}
  aws_secret_access_key: secret
  aws_endpoint_url_s3: http://localhost:9000
  aws_region: us-east-1
  service: s3
auth:
  jwt_secret: ${MARKSTASH_TEST_UNSET_SECRET:-}
"#;

    #[test]
    fn test_defaults_and_substitution() {
        let cfg = Config::from_yaml(SAMPLE).unwrap();
        assert_eq!(cfg.app.get_db(), "markstash.db");
        assert_eq!(cfg.app.get_port(), 8080);
        assert_eq!(cfg.app.sync_interval_seconds, 60);
        assert_eq!(cfg.app.signed_url_expiration(), Duration::from_secs(300));
        assert_eq!(cfg.storage.aws_access_key_id, "local-key");
        assert_eq!(cfg.auth.jwt_secret(), None);
    }

    #[test]
    fn test_auth_section_is_optional() {
        let yaml = SAMPLE.split("auth:").next().unwrap();
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.auth.jwt_secret(), None);
    }
}
