use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::StorageError;

/// Key/value storage that outlives the view: browser localStorage on the web,
/// a small JSON file for the native shell, a map in tests.
pub trait TokenStorage {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.items.borrow_mut().clear();
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use self::file::FileStorage;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::HashMap;
    use std::fs;
    use std::io::ErrorKind;
    use std::path::{Path, PathBuf};

    use log::warn;

    use super::TokenStorage;
    use crate::error::StorageError;

    /// A JSON object on disk; every write rewrites the whole file.
    pub struct FileStorage {
        path: PathBuf,
    }

    impl FileStorage {
        pub fn new(path: impl AsRef<Path>) -> Self {
            FileStorage {
                path: path.as_ref().to_path_buf(),
            }
        }

        fn read(&self) -> Result<HashMap<String, String>, StorageError> {
            match fs::read_to_string(&self.path) {
                Ok(contents) if contents.trim().is_empty() => Ok(HashMap::new()),
                Ok(contents) => Ok(serde_json::from_str(&contents)?),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(HashMap::new()),
                Err(err) => Err(err.into()),
            }
        }

        fn write(&self, items: &HashMap<String, String>) -> Result<(), StorageError> {
            fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
            Ok(())
        }
    }

    impl TokenStorage for FileStorage {
        fn get_item(&self, key: &str) -> Option<String> {
            match self.read() {
                Ok(mut items) => items.remove(key),
                Err(err) => {
                    warn!("could not read {}: {}", self.path.display(), err);
                    None
                }
            }
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let mut items = self.read()?;
            items.insert(key.to_owned(), value.to_owned());
            self.write(&items)
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            let mut items = self.read()?;
            if items.remove(key).is_some() {
                self.write(&items)?;
            }
            Ok(())
        }

        fn clear(&self) -> Result<(), StorageError> {
            match fs::remove_file(&self.path) {
                Err(err) if err.kind() != ErrorKind::NotFound => Err(err.into()),
                _ => Ok(()),
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use self::web::{get_local_storage, LocalStorage};

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::Storage;

    use super::TokenStorage;
    use crate::error::StorageError;

    pub fn get_local_storage() -> Option<Storage> {
        web_sys::window()?.local_storage().ok()?
    }

    pub struct LocalStorage {
        storage: Storage,
    }

    impl LocalStorage {
        pub fn new() -> Result<Self, StorageError> {
            let storage = get_local_storage().ok_or(StorageError::Unavailable)?;
            Ok(LocalStorage { storage })
        }
    }

    impl TokenStorage for LocalStorage {
        fn get_item(&self, key: &str) -> Option<String> {
            self.storage.get_item(key).ok().flatten()
        }

        fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.storage
                .set_item(key, value)
                .map_err(|_err| StorageError::Write(key.to_owned()))
        }

        fn remove_item(&self, key: &str) -> Result<(), StorageError> {
            self.storage
                .remove_item(key)
                .map_err(|_err| StorageError::Write(key.to_owned()))
        }

        fn clear(&self) -> Result<(), StorageError> {
            self.storage.clear().map_err(|_err| StorageError::Unavailable)
        }
    }
}
