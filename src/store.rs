//! Durable credential storage
//!
//! Holds exactly one value: the raw credential of the last established
//! session. Absence means the client is anonymous.

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FdError, Result};

/// Durable home of the session credential
pub trait CredentialStorage {
    /// Read the stored credential, `None` when nothing is stored
    fn load(&self) -> Result<Option<String>>;
    /// Replace the stored credential
    fn save(&mut self, token: &str) -> Result<()>;
    /// Remove the stored credential; a no-op when nothing is stored
    fn erase(&mut self) -> Result<()>;
}

/// On-disk layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    pub saved_at: DateTime<Utc>,
}

/// Credential storage configuration
#[derive(Debug, Clone, Default)]
pub struct TokenStoreConfig {
    pub enabled: bool,
    pub storage_path: Option<PathBuf>,
    pub encryption_key: Option<String>,
}

/// File-backed credential storage
///
/// When disabled, nothing touches the disk and `load` always reports an
/// empty store.
#[derive(Debug)]
pub struct FileStorage {
    config: TokenStoreConfig,
}

impl FileStorage {
    pub fn new(config: TokenStoreConfig) -> Result<Self> {
        if config.enabled && config.storage_path.is_none() {
            return Err(FdError::invalid_input("Token storage path not configured"));
        }
        if matches!(&config.encryption_key, Some(key) if key.is_empty()) {
            return Err(FdError::invalid_input("Token storage key cannot be empty"));
        }
        Ok(Self { config })
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.config.storage_path.as_deref()
    }

    fn get_storage_path(&self) -> Result<&Path> {
        self.storage_path()
            .ok_or_else(|| FdError::invalid_input("Token storage path not configured"))
    }

    fn read_document(&self) -> Result<Option<StoredCredential>> {
        let path = self.get_storage_path()?;

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .map_err(|e| FdError::io("Credential storage", format!("Failed to read: {}", e)))?;

        if content.trim().is_empty() {
            return Ok(None);
        }

        let decrypted_content = if let Some(key) = &self.config.encryption_key {
            self.decrypt_content(content.trim(), key)?
        } else {
            content
        };

        let stored: Option<StoredCredential> = serde_json::from_str(&decrypted_content)
            .map_err(|e| FdError::io("Credential storage", format!("Failed to parse: {}", e)))?;

        Ok(stored)
    }

    fn write_document(&self, stored: &StoredCredential) -> Result<()> {
        let path = self.get_storage_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                FdError::storage_write(format!("Failed to create storage directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(stored)?;

        let final_content = if let Some(key) = &self.config.encryption_key {
            self.encrypt_content(&content, key)
        } else {
            content
        };

        fs::write(path, final_content)
            .map_err(|e| FdError::storage_write(format!("Failed to write: {}", e)))?;

        Ok(())
    }

    fn encrypt_content(&self, content: &str, key: &str) -> String {
        let key_bytes = key.as_bytes();
        let encrypted: Vec<u8> = content
            .as_bytes()
            .iter()
            .enumerate()
            .map(|(i, &byte)| byte ^ key_bytes[i % key_bytes.len()])
            .collect();

        base64::engine::general_purpose::STANDARD.encode(encrypted)
    }

    fn decrypt_content(&self, encrypted_content: &str, key: &str) -> Result<String> {
        let encrypted_bytes = base64::engine::general_purpose::STANDARD
            .decode(encrypted_content)
            .map_err(|e| FdError::io("Credential storage", format!("Failed to decode: {}", e)))?;

        let key_bytes = key.as_bytes();
        let decrypted: Vec<u8> = encrypted_bytes
            .iter()
            .enumerate()
            .map(|(i, &byte)| byte ^ key_bytes[i % key_bytes.len()])
            .collect();

        String::from_utf8(decrypted)
            .map_err(|e| FdError::io("Credential storage", format!("Failed to decode: {}", e)))
    }
}

impl CredentialStorage for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.config.enabled {
            return Ok(None);
        }
        Ok(self.read_document()?.map(|stored| stored.token))
    }

    fn save(&mut self, token: &str) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        self.write_document(&StoredCredential {
            token: token.to_string(),
            saved_at: Utc::now(),
        })
    }

    fn erase(&mut self) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let path = self.get_storage_path()?;
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FdError::storage_write(format!("Failed to erase: {}", e))),
        }
    }
}
