//! YAML configuration loading and the ancillary plain-file loaders,
//! grounded on `config_loader.py`'s `Config` class.

use std::path::Path;

use serde::{Deserialize, Deserializer};

use crate::error::{ConfigError, Result};

/// YAML lets `Port` be written as a bare integer or a quoted string;
/// both are accepted and normalized to a string, matching how Python's
/// f-string interpolation would stringify either.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

fn default_mongo_prefix() -> String {
    "mongodb://".to_string()
}

fn default_mongo_host() -> String {
    "127.0.0.1".to_string()
}

fn default_mongo_port() -> String {
    "27017".to_string()
}

fn default_sftp_host() -> String {
    "0.0.0.0".to_string()
}

fn default_sftp_port() -> String {
    "8022".to_string()
}

fn default_sftp_auths() -> Vec<SftpAuth> {
    vec![SftpAuth {
        username: "Anonymous".to_string(),
        password: Some("susman".to_string()),
        pubkey: None,
    }]
}

#[derive(Debug, Clone, Deserialize)]
struct RawDocument {
    #[serde(rename = "MongoDB", default)]
    mongodb: RawMongoDb,
    #[serde(rename = "SFTP", default)]
    sftp: RawSftp,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawMongoDb {
    #[serde(rename = "Prefix", default = "default_mongo_prefix")]
    prefix: String,
    #[serde(rename = "Host", default = "default_mongo_host")]
    host: String,
    #[serde(
        rename = "Port",
        default = "default_mongo_port",
        deserialize_with = "string_or_number"
    )]
    port: String,
}

impl Default for RawMongoDb {
    fn default() -> Self {
        Self {
            prefix: default_mongo_prefix(),
            host: default_mongo_host(),
            port: default_mongo_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RawSftp {
    #[serde(rename = "Host", default = "default_sftp_host")]
    host: String,
    #[serde(
        rename = "Port",
        default = "default_sftp_port",
        deserialize_with = "string_or_number"
    )]
    port: String,
    #[serde(rename = "NoAuth", default)]
    no_auth: bool,
    #[serde(rename = "Auths", default = "default_sftp_auths")]
    auths: Vec<SftpAuth>,
}

impl Default for RawSftp {
    fn default() -> Self {
        Self {
            host: default_sftp_host(),
            port: default_sftp_port(),
            no_auth: false,
            auths: default_sftp_auths(),
        }
    }
}

/// One entry of the `SFTP.Auths` list: a username paired with either a
/// password or a public key (or neither, for anonymous access when
/// `NoAuth` is set).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SftpAuth {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password", default)]
    pub password: Option<String>,
    #[serde(rename = "PubKey", default)]
    pub pubkey: Option<String>,
}

/// The resolved configuration document, after defaults are applied.
#[derive(Debug, Clone)]
pub struct Config {
    /// Full MongoDB connection URL: `<prefix><host>:<port>`.
    pub mongodb_url: String,
    pub sftp_host: String,
    pub sftp_port: String,
    pub sftp_no_auth: bool,
    pub sftp_auths: Vec<SftpAuth>,
}

impl Config {
    /// Loads and resolves the YAML document at `path`.
    pub fn load_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let doc: RawDocument = serde_yaml::from_str(&raw)?;
        Ok(Self {
            mongodb_url: format!(
                "{prefix}{host}:{port}",
                prefix = doc.mongodb.prefix,
                host = doc.mongodb.host,
                port = doc.mongodb.port,
            ),
            sftp_host: doc.sftp.host,
            sftp_port: doc.sftp.port,
            sftp_no_auth: doc.sftp.no_auth,
            sftp_auths: doc.sftp.auths,
        })
    }

    /// Reads the raw bytes of the SFTP host private key. Parsing it into
    /// a usable key type is the out-of-scope SFTP front-end's job; this
    /// crate only surfaces the bytes it would need.
    pub fn load_host_key(path: impl AsRef<Path>) -> Result<Vec<u8>> {
        let path = path.as_ref();
        std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Reads a newline-separated list of webhook URLs, dropping blank
    /// lines the way `str.splitlines()` would leave them out of the
    /// final list when the file has no trailing content.
    pub fn load_webhooks(path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(raw.lines().map(str::to_string).collect())
    }

    /// Reads and trims the bot token file.
    pub fn load_bot_token(path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(raw.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "MongoDB: {}\nSFTP: {}\n").unwrap();

        let config = Config::load_config_file(&path).unwrap();
        assert_eq!(config.mongodb_url, "mongodb://127.0.0.1:27017");
        assert_eq!(config.sftp_host, "0.0.0.0");
        assert_eq!(config.sftp_port, "8022");
        assert!(!config.sftp_no_auth);
        assert_eq!(config.sftp_auths.len(), 1);
        assert_eq!(config.sftp_auths[0].username, "Anonymous");
    }

    #[test]
    fn explicit_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "MongoDB:\n  Host: db.internal\n  Port: 27018\nSFTP:\n  Host: 10.0.0.1\n  NoAuth: true\n",
        )
        .unwrap();

        let config = Config::load_config_file(&path).unwrap();
        assert_eq!(config.mongodb_url, "mongodb://db.internal:27018");
        assert_eq!(config.sftp_host, "10.0.0.1");
        assert!(config.sftp_no_auth);
    }

    #[test]
    fn webhooks_are_split_on_newlines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webhooks.txt");
        std::fs::write(&path, "https://a.example\nhttps://b.example\n").unwrap();

        let hooks = Config::load_webhooks(&path).unwrap();
        assert_eq!(hooks, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn bot_token_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.txt");
        std::fs::write(&path, "  secret-token\n").unwrap();

        assert_eq!(Config::load_bot_token(&path).unwrap(), "secret-token");
    }
}
