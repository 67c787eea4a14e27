use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use keyring::credential::{CredentialBuilder, CredentialBuilderApi};
use keyring::Entry;
use parking_lot::Mutex;

use super::storage::KeyValueStore;

const SERVICE_NAME: &str = "echo";

/// Session entries kept in the OS keychain, one credential per key.
///
/// Entries are created once per key and reused, so every read and write for
/// a key goes through the same credential.
pub struct KeyringStore {
    service: String,
    builder: Option<Arc<CredentialBuilder>>,
    entries: Mutex<HashMap<String, Arc<Entry>>>,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
            builder: None,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Build credentials with `builder` instead of the platform keychain
    pub fn with_builder(service: &str, builder: Box<CredentialBuilder>) -> Self {
        Self {
            builder: Some(Arc::from(builder)),
            ..Self::with_service(service)
        }
    }

    fn entry(&self, key: &str) -> Result<Arc<Entry>> {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.get(key) {
            return Ok(Arc::clone(entry));
        }

        let entry = match &self.builder {
            Some(builder) => builder
                .build(None, &self.service, key)
                .map(Entry::new_with_credential),
            None => Entry::new(&self.service, key),
        }
        .context("Failed to create keyring entry")?;

        let entry = Arc::new(entry);
        entries.insert(key.to_string(), Arc::clone(&entry));
        Ok(entry)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for KeyringStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve session entry from keychain"),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store session entry in keychain")
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete session entry from keychain"),
        }
    }
}
