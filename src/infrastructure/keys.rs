use super::signing::{Secp256k1Signer, read_public_key_file};
use crate::error::{Result, ShipmentError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding one key pair per place: `<place>.priv` and `<place>.pub`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDirectory {
    dir: PathBuf,
}

impl KeyDirectory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.sawtooth/keys`, falling back to a relative path when no home
    /// directory is known.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_default()
            .join(".sawtooth")
            .join("keys")
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn private_key_path(&self, place: &str) -> PathBuf {
        self.dir.join(format!("{}.priv", place))
    }

    pub fn public_key_path(&self, place: &str) -> PathBuf {
        self.dir.join(format!("{}.pub", place))
    }

    pub fn load_signer(&self, place: &str) -> Result<Secp256k1Signer> {
        let path = self.private_key_path(place);
        debug!(place, path = %path.display(), "loading private key");
        Secp256k1Signer::from_key_file(&path)
    }

    pub fn load_public_key(&self, place: &str) -> Result<String> {
        let path = self.public_key_path(place);
        debug!(place, path = %path.display(), "loading public key");
        read_public_key_file(&path)
    }

    /// Writes `signer`'s key pair for `place`, refusing to overwrite unless `force`.
    pub fn store_key_pair(
        &self,
        place: &str,
        signer: &Secp256k1Signer,
        force: bool,
    ) -> Result<(PathBuf, PathBuf)> {
        let private_path = self.private_key_path(place);
        let public_path = self.public_key_path(place);

        if !force {
            for path in [&private_path, &public_path] {
                if path.exists() {
                    return Err(ShipmentError::KeyError(format!(
                        "file exists: {} (use --force to overwrite)",
                        path.display()
                    )));
                }
            }
        }

        fs::create_dir_all(&self.dir)?;
        fs::write(&private_path, format!("{}\n", signer.private_key_hex()))?;
        fs::write(&public_path, format!("{}\n", signer.public_key_hex()))?;
        Ok((private_path, public_path))
    }
}

impl Default for KeyDirectory {
    fn default() -> Self {
        Self::new(Self::default_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_paths_follow_place_names() {
        let keys = KeyDirectory::new("/keys");
        assert_eq!(keys.private_key_path("Warehouse"), PathBuf::from("/keys/Warehouse.priv"));
        assert_eq!(keys.public_key_path("Store"), PathBuf::from("/keys/Store.pub"));
    }

    #[test]
    fn test_store_then_load_key_pair() {
        let dir = tempdir().unwrap();
        let keys = KeyDirectory::new(dir.path().join("keys"));
        let signer = Secp256k1Signer::generate();

        keys.store_key_pair("Warehouse", &signer, false).unwrap();

        let loaded = keys.load_signer("Warehouse").unwrap();
        assert_eq!(loaded.public_key_hex(), signer.public_key_hex());
        assert_eq!(keys.load_public_key("Warehouse").unwrap(), signer.public_key_hex());
    }

    #[test]
    fn test_store_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let keys = KeyDirectory::new(dir.path());
        let first = Secp256k1Signer::generate();
        let second = Secp256k1Signer::generate();

        keys.store_key_pair("Store", &first, false).unwrap();
        assert!(matches!(
            keys.store_key_pair("Store", &second, false),
            Err(ShipmentError::KeyError(_))
        ));

        keys.store_key_pair("Store", &second, true).unwrap();
        assert_eq!(keys.load_public_key("Store").unwrap(), second.public_key_hex());
    }

    #[test]
    fn test_missing_key_is_a_key_error() {
        let dir = tempdir().unwrap();
        let keys = KeyDirectory::new(dir.path());
        assert!(matches!(keys.load_signer("Nowhere"), Err(ShipmentError::KeyError(_))));
        assert!(matches!(keys.load_public_key("Nowhere"), Err(ShipmentError::KeyError(_))));
    }
}
