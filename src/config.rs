use crate::infrastructure::keys::KeyDirectory;
use crate::infrastructure::rest::RestGateway;
use std::path::PathBuf;

/// REST API used when neither `--url` nor `SHIPMENT_URL` is given.
pub const DEFAULT_URL: &str = "http://rest-api:8008";

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub url: String,
    pub key_dir: PathBuf,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>, key_dir: Option<PathBuf>) -> Self {
        Self {
            url: url.into(),
            key_dir: key_dir.unwrap_or_else(KeyDirectory::default_dir),
        }
    }

    pub fn keys(&self) -> KeyDirectory {
        KeyDirectory::new(self.key_dir.clone())
    }

    pub fn gateway(&self) -> RestGateway {
        RestGateway::new(&self.url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL, None)
    }
}
