//! Durable session snapshot: the last submitted request and the last
//! optimal result.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use lpform_form::FormState;
use lpform_model::{ProblemRequest, SolveResult};
use thiserror::Error;
use tracing::{debug, warn};

pub const REQUEST_KEY: &str = "last-request";
pub const RESULT_KEY: &str = "last-result";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Key-value storage that outlives a single run
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn io_error(key: &str) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        key: key.to_string(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key)(e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir).map_err(io_error(key))?;
        // write-then-rename so a crash never leaves half a snapshot behind
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        std::fs::write(&tmp, value).map_err(io_error(key))?;
        std::fs::rename(&tmp, self.path(key)).map_err(io_error(key))
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key)(e)),
        }
    }
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed access to the session snapshot.
///
/// Reads are best-effort: a missing value is a fresh session, a corrupt one
/// is logged and treated as missing.
#[derive(Debug)]
pub struct PersistenceStore<S> {
    backend: S,
}

impl<S: KeyValueStore> PersistenceStore<S> {
    pub fn new(backend: S) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn write_request(&mut self, request: &ProblemRequest) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(request).map_err(PersistenceError::Encode)?;
        self.backend.set(REQUEST_KEY, &json)?;
        Ok(())
    }

    pub fn write_result(&mut self, raw: &str) -> Result<(), PersistenceError> {
        self.backend.set(RESULT_KEY, raw)?;
        Ok(())
    }

    pub fn clear_result(&mut self) -> Result<(), PersistenceError> {
        self.backend.remove(RESULT_KEY)?;
        Ok(())
    }

    pub fn try_read_request(&self) -> Result<Option<ProblemRequest>, PersistenceError> {
        let Some(raw) = self.backend.get(REQUEST_KEY)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|source| PersistenceError::Corrupt {
            key: REQUEST_KEY,
            source,
        })
    }

    pub fn read_request(&self) -> Option<ProblemRequest> {
        self.try_read_request().unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring stored request");
            None
        })
    }

    /// Raw body of the last optimal response
    pub fn read_result(&self) -> Option<String> {
        self.backend.get(RESULT_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "Ignoring stored result");
            None
        })
    }

    pub fn read_solve_result(&self) -> Option<SolveResult> {
        let raw = self.read_result()?;
        serde_json::from_str(&raw)
            .inspect_err(|e| warn!(error = %e, "Stored result does not parse"))
            .ok()
    }

    /// The form as it was last submitted, or the default form
    pub fn restore_form(&self) -> FormState {
        match self.read_request() {
            Some(request) => {
                debug!(
                    variables = request.num_variables(),
                    constraints = request.num_constraints(),
                    "Restored previous request"
                );
                FormState::from_request(&request)
            }
            None => FormState::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpform_model::{Constraint, Direction, Relation};

    fn request() -> ProblemRequest {
        ProblemRequest::new(
            Direction::Minimize,
            vec![2.0, 3.0, -1.5],
            vec![
                Constraint::new(vec![1.0, 1.0, 0.0], Relation::Ge, 4.0),
                Constraint::new(vec![1.0, 0.0, 2.0], Relation::Le, 3.0),
                Constraint::new(vec![0.0, 1.0, 1.0], Relation::Eq, 3.25),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_request_round_trip_preserves_order() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        assert!(store.read_request().is_none());
        store.write_request(&request()).unwrap();
        assert_eq!(store.read_request(), Some(request()));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        store.write_request(&request()).unwrap();
        store.write_result(r#"{"status":"optimo"}"#).unwrap();
        store.clear_result().unwrap();
        assert!(store.read_result().is_none());
        assert_eq!(store.read_request(), Some(request()));
    }

    #[test]
    fn test_corrupt_request_restores_default_form() {
        let mut backend = MemoryStore::new();
        backend.set(REQUEST_KEY, "{not json").unwrap();
        let store = PersistenceStore::new(backend);
        assert!(matches!(
            store.try_read_request(),
            Err(PersistenceError::Corrupt { .. })
        ));
        assert!(store.read_request().is_none());
        assert_eq!(store.restore_form(), FormState::default());
    }

    #[test]
    fn test_restore_form_from_stored_request() {
        let mut store = PersistenceStore::new(MemoryStore::new());
        store.write_request(&request()).unwrap();
        let form = store.restore_form();
        assert_eq!(form.direction, Direction::Minimize);
        assert_eq!(form.variable_count, "3");
        assert_eq!(form.constraints[2].rhs, "3.25");
        let rebuilt = lpform_form::build_request(&form.fields()).unwrap();
        assert_eq!(rebuilt, request());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let mut store = PersistenceStore::new(FileStore::new(dir.path().join("state")));
            store.write_request(&request()).unwrap();
            store.write_result("raw").unwrap();
        }
        let mut store = PersistenceStore::new(FileStore::new(dir.path().join("state")));
        assert_eq!(store.read_request(), Some(request()));
        assert_eq!(store.read_result().as_deref(), Some("raw"));
        store.clear_result().unwrap();
        store.clear_result().unwrap();
        assert!(store.read_result().is_none());
    }

    #[test]
    fn test_missing_directory_reads_as_fresh_session() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = PersistenceStore::new(FileStore::new(dir.path().join("nope")));
        assert!(store.read_request().is_none());
        assert!(store.read_result().is_none());
    }
}
