//! JSON file record store.
//!
//! The file is the source of truth. Several handles, in one process or in
//! several, may share one database: every write holds an exclusive advisory
//! lock on a sibling `<file>.lock`, re-reads the document, appends and writes
//! the new document to a temporary file that is renamed over the old one.
//! Readers never see a half-written file and reload whenever the file on
//! disk has changed since they last read it.
//!
//! With a database password the document is sealed (Argon2id + AES-256-GCM)
//! and stored PEM-armored under [`SEALED_DATABASE_LABEL`].

use super::recovery::plan_import;
use super::{next_id, CertificateStore};
use crate::cert::model::{Certificate, CertificateId, NewCertificate};
use crate::crypto::encryption::{open, seal};
use crate::error::{Result, StepinError};
use chrono::Utc;
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;
use tracing::{debug, info};
use zeroize::Zeroizing;

/// PEM label of a sealed database file.
pub const SEALED_DATABASE_LABEL: &str = "STEPIN SEALED DATABASE";

/// On-disk document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Database {
    certificates: Vec<Certificate>,
}

/// Identity of the file contents last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(StepinError::StorageError)?;
        Ok(Self {
            modified: metadata.modified().map_err(StepinError::StorageError)?,
            len: metadata.len(),
        })
    }
}

#[derive(Debug)]
struct Snapshot {
    records: Vec<Certificate>,
    stamp: FileStamp,
}

/// A record store backed by a single JSON file.
pub struct FileStore {
    path: PathBuf,
    password: Option<Zeroizing<String>>,
    snapshot: Mutex<Snapshot>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("sealed", &self.password.is_some())
            .finish_non_exhaustive()
    }
}

impl FileStore {
    /// Open the store at `path`, creating an empty database if none exists.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use stepin::storage::{CertificateStore, FileStore};
    ///
    /// # fn example() -> stepin::Result<()> {
    /// let store = FileStore::open("stepin.json", None)?;
    /// println!("{} certificates", store.list_all()?.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>, password: Option<&str>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let password = password
            .filter(|password| !password.is_empty())
            .map(|password| Zeroizing::new(password.to_string()));

        if !path.exists() {
            let mut lock = RwLock::new(open_lock_file(&path)?);
            let _guard = lock.write().map_err(StepinError::StorageError)?;
            // Another handle may have created it while we waited.
            if !path.exists() {
                let contents = encode(&Database::default(), password.as_ref().map(|p| p.as_str()))?;
                write_atomically(&path, &contents)?;
                info!(path = %path.display(), "created certificate database");
            }
        }

        let store = Self {
            snapshot: Mutex::new(read_snapshot(&path, password.as_ref().map(|p| p.as_str()))?),
            path,
            password,
        };
        debug!(path = %store.path.display(), "opened certificate database");

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file on disk is sealed with a database password.
    pub fn is_sealed(&self) -> bool {
        self.password.is_some()
    }

    fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|p| p.as_str())
    }

    /// The snapshot, reloaded first if the file changed since it was read.
    fn current(&self) -> Result<MutexGuard<'_, Snapshot>> {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        if FileStamp::of(&self.path)? != snapshot.stamp {
            *snapshot = read_snapshot(&self.path, self.password())?;
        }
        Ok(snapshot)
    }

    /// Run `append` against the latest records under the file lock and write
    /// the result. Nothing is written when `append` fails.
    fn update<T, F>(&self, append: F) -> Result<T>
    where
        F: FnOnce(&mut Vec<Certificate>) -> Result<T>,
    {
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
        let persist_error = |e: StepinError| {
            StepinError::PersistenceFailed(format!("Failed to write {}: {}", self.path.display(), e))
        };

        let mut lock = RwLock::new(open_lock_file(&self.path).map_err(persist_error)?);
        let _guard = lock
            .write()
            .map_err(|e| persist_error(StepinError::StorageError(e)))?;

        let mut latest = read_snapshot(&self.path, self.password()).map_err(persist_error)?;
        let result = append(&mut latest.records)?;

        let database = Database {
            certificates: latest.records,
        };
        let contents = encode(&database, self.password()).map_err(persist_error)?;
        write_atomically(&self.path, &contents).map_err(persist_error)?;

        *snapshot = Snapshot {
            records: database.certificates,
            stamp: FileStamp::of(&self.path).map_err(persist_error)?,
        };
        Ok(result)
    }
}

impl CertificateStore for FileStore {
    fn list_all(&self) -> Result<Vec<Certificate>> {
        Ok(self.current()?.records.clone())
    }

    fn get_by_id(&self, id: CertificateId) -> Result<Certificate> {
        self.current()?
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| StepinError::NotFound(format!("Certificate {} not found", id)))
    }

    fn create(&self, certificate: NewCertificate) -> Result<Certificate> {
        self.update(|records| {
            let record = certificate.into_certificate(next_id(records), Utc::now());
            records.push(record.clone());
            Ok(record)
        })
    }

    fn import(&self, incoming: Vec<Certificate>) -> Result<Vec<Certificate>> {
        let added = self.update(|records| {
            let added = plan_import(records, incoming)?;
            records.extend(added.iter().cloned());
            Ok(added)
        })?;
        info!(path = %self.path.display(), count = added.len(), "imported certificates");
        Ok(added)
    }
}

fn read_snapshot(path: &Path, password: Option<&str>) -> Result<Snapshot> {
    let stamp = FileStamp::of(path)?;
    let contents = fs::read_to_string(path).map_err(StepinError::StorageError)?;
    let database = decode(&contents, password)?;
    debug!(
        path = %path.display(),
        count = database.certificates.len(),
        "loaded certificate database"
    );
    Ok(Snapshot {
        records: database.certificates,
        stamp,
    })
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(sibling(path, ".lock"))
        .map_err(StepinError::StorageError)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn encode(database: &Database, password: Option<&str>) -> Result<String> {
    let json = Zeroizing::new(serde_json::to_string_pretty(database).map_err(StepinError::JsonError)?);
    match password {
        Some(password) => {
            let sealed = seal(json.as_bytes(), password)?;
            Ok(pem::encode(&pem::Pem::new(SEALED_DATABASE_LABEL, sealed)))
        }
        None => Ok(json.to_string()),
    }
}

fn decode(contents: &str, password: Option<&str>) -> Result<Database> {
    let sealed = contents
        .trim_start()
        .starts_with(&format!("-----BEGIN {}-----", SEALED_DATABASE_LABEL));

    match (sealed, password) {
        (true, Some(password)) => {
            let block = pem::parse(contents)
                .map_err(|e| StepinError::PemError(format!("Failed to parse PEM: {}", e)))?;
            let json = open(block.contents(), password)?;
            serde_json::from_slice(&json).map_err(StepinError::JsonError)
        }
        (true, None) => Err(StepinError::ConfigError(
            "Certificate database is sealed; a database password is required".to_string(),
        )),
        (false, Some(_)) => Err(StepinError::ConfigError(
            "Certificate database is not sealed; remove the database password or use a new file"
                .to_string(),
        )),
        (false, None) => serde_json::from_str(contents).map_err(StepinError::JsonError),
    }
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let temp_path = sibling(path, ".tmp");

    fs::write(&temp_path, contents).map_err(StepinError::StorageError)?;
    fs::rename(&temp_path, path).map_err(StepinError::StorageError)?;

    Ok(())
}
