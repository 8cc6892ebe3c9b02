//! The last-used model preference port.
//!
//! One string of client-local state: which model the user picked last. Read
//! once at startup, written on every selection change, cleared when the
//! selected model is deleted.

use std::future::Future;
use std::path::PathBuf;

use confab_types::PreferenceError;
use tokio::sync::RwLock;

/// Storage for the last-used model name.
///
/// Uses RPITIT and is not object-safe; sessions compose over
/// `<P: PreferenceStore>` generics.
pub trait PreferenceStore: Send + Sync {
    /// Read the stored model name, if any.
    fn load_model(&self) -> impl Future<Output = Result<Option<String>, PreferenceError>> + Send;

    /// Store the model name, replacing any previous value.
    fn store_model(&self, name: &str) -> impl Future<Output = Result<(), PreferenceError>> + Send;

    /// Remove the stored model name. Clearing an empty store is not an
    /// error.
    fn clear_model(&self) -> impl Future<Output = Result<(), PreferenceError>> + Send;
}

/// In-memory preference store.
///
/// Suitable for tests and short-lived processes where the preference does
/// not need to survive a restart.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    model: RwLock<Option<String>>,
}

impl MemoryPreferences {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    async fn load_model(&self) -> Result<Option<String>, PreferenceError> {
        Ok(self.model.read().await.clone())
    }

    async fn store_model(&self, name: &str) -> Result<(), PreferenceError> {
        *self.model.write().await = Some(name.to_string());
        Ok(())
    }

    async fn clear_model(&self) -> Result<(), PreferenceError> {
        *self.model.write().await = None;
        Ok(())
    }
}

/// File-backed preference store holding the model name in one small file.
///
/// A missing file reads as "nothing stored".
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    /// Create a store at the given file path.
    ///
    /// Parent directories are created on the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PreferenceStore for FilePreferences {
    async fn load_model(&self) -> Result<Option<String>, PreferenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let name = contents.trim();
                if name.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(name.to_string()))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_model(&self, name: &str) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, name).await?;
        Ok(())
    }

    async fn clear_model(&self) -> Result<(), PreferenceError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
