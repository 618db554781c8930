//! Persistent key/value storage for the session token and draft data.
//!
//! DESIGN
//! ======
//! `Store` needs only `get`/`set`/`remove` of opaque strings; the token,
//! applicant id and saved application form are provided methods over fixed
//! keys. `FileStore` keeps a JSON object on disk so values survive restarts;
//! `MemoryStore` is process-local.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use crate::error::ClientError;

pub const TOKEN_KEY: &str = "token";
pub const APPLICANT_ID_KEY: &str = "applicantId";
pub const APPLICATION_FORM_KEY: &str = "applicationFormData";

// =============================================================================
// STORE TRAIT
// =============================================================================

pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    ///
    /// Returns an error if the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), ClientError>;

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), ClientError>;

    /// Bearer token, if one is stored. An empty string counts as absent.
    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted.
    fn set_token(&self, token: &str) -> Result<(), ClientError> {
        self.set(TOKEN_KEY, token)
    }

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn clear_token(&self) -> Result<(), ClientError> {
        self.remove(TOKEN_KEY)
    }

    fn applicant_id(&self) -> Option<String> {
        self.get(APPLICANT_ID_KEY)
    }

    /// Store the applicant id. Only hyphenated UUIDs are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidApplicantId`] for anything else.
    fn set_applicant_id(&self, applicant_id: &str) -> Result<(), ClientError> {
        if !is_hyphenated_uuid(applicant_id) {
            return Err(ClientError::InvalidApplicantId(applicant_id.to_string()));
        }
        self.set(APPLICANT_ID_KEY, applicant_id)
    }

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn clear_applicant_id(&self) -> Result<(), ClientError> {
        self.remove(APPLICANT_ID_KEY)
    }

    /// Saved application form draft.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Parse`] if the stored value is not valid JSON.
    fn application_form(&self) -> Result<Option<serde_json::Value>, ClientError> {
        self.get(APPLICATION_FORM_KEY)
            .map(|raw| serde_json::from_str(&raw).map_err(|e| ClientError::Parse(e.to_string())))
            .transpose()
    }

    /// # Errors
    ///
    /// Returns an error if the draft cannot be serialized or persisted.
    fn set_application_form(&self, data: &serde_json::Value) -> Result<(), ClientError> {
        let raw = serde_json::to_string(data).map_err(|e| ClientError::Parse(e.to_string()))?;
        self.set(APPLICATION_FORM_KEY, &raw)
    }

    /// # Errors
    ///
    /// Returns an error if the removal cannot be persisted.
    fn delete_application_form(&self) -> Result<(), ClientError> {
        self.remove(APPLICATION_FORM_KEY)
    }
}

/// `Uuid::parse_str` also accepts simple, braced and URN forms; the backend
/// only issues the 36-char hyphenated form.
fn is_hyphenated_uuid(raw: &str) -> bool {
    raw.len() == 36 && Uuid::try_parse(raw).is_ok()
}

// =============================================================================
// MEMORY STORE
// =============================================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON-object file store. The whole map is rewritten on every mutation,
/// through a sibling `.tmp` file renamed over the store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing values if the file exists.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Store`] if the file exists but cannot be read,
    /// or [`ClientError::Parse`] if it is not a JSON object of strings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| ClientError::Parse(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ClientError::Store(e)),
        };
        Ok(Self { path, values: Mutex::new(values) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(values).map_err(|e| ClientError::Parse(e.to_string()))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Sibling file each write goes through before replacing the store.
    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<(), ClientError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.persist(&values)
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
