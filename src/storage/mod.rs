//! Certificate record storage.
//!
//! The issuance engine only needs three operations from its record store,
//! captured by [`CertificateStore`]. Two implementations ship with the crate:
//!
//! - [`memory::MemoryStore`]: process-local, used by tests and embedders
//! - [`file::FileStore`]: a JSON document on disk, optionally sealed with a
//!   database password
//!
//! [`recovery`] exports a store as plain JSON and imports such an export back.

pub mod file;
pub mod memory;
pub mod recovery;

use crate::cert::model::{Certificate, CertificateId, NewCertificate};
use crate::error::Result;
use std::sync::Arc;

pub use file::FileStore;
pub use memory::MemoryStore;

/// A persistent collection of issued certificates.
///
/// Records are append-only. Implementations assign ids starting at 1 in
/// strictly increasing order and stamp `created_at` on create.
pub trait CertificateStore: Send + Sync {
    /// Every record, in insertion order.
    fn list_all(&self) -> Result<Vec<Certificate>>;

    /// Fetch one record; a missing id fails with `NotFound`.
    fn get_by_id(&self, id: CertificateId) -> Result<Certificate>;

    /// Persist a new record; failures surface as `PersistenceFailed`.
    fn create(&self, certificate: NewCertificate) -> Result<Certificate>;

    /// Append exported records, keeping their ids.
    ///
    /// Returns the records actually added. Either every record is added or
    /// none is; see [`recovery`] for the merge rules.
    fn import(&self, records: Vec<Certificate>) -> Result<Vec<Certificate>>;
}

impl<S: CertificateStore + ?Sized> CertificateStore for Arc<S> {
    fn list_all(&self) -> Result<Vec<Certificate>> {
        (**self).list_all()
    }

    fn get_by_id(&self, id: CertificateId) -> Result<Certificate> {
        (**self).get_by_id(id)
    }

    fn create(&self, certificate: NewCertificate) -> Result<Certificate> {
        (**self).create(certificate)
    }

    fn import(&self, records: Vec<Certificate>) -> Result<Vec<Certificate>> {
        (**self).import(records)
    }
}

/// Next id for an append-only record list.
fn next_id(records: &[Certificate]) -> CertificateId {
    records.last().map_or(1, |last| last.id + 1)
}
