//! Issuance orchestration.
//!
//! [`CertificateIssuer`] runs a request through validation, key generation,
//! signing, key encryption, inspection and persistence. Nothing reaches the
//! store unless every step succeeds.
//!
//! Requests naming the same parent CA are serialized from validation through
//! signing; requests against different parents run in parallel.
//!
//! Callers get a [`CertificateView`], so CA private keys stay in the store.

use crate::cert::builder::{certificate_params, sign};
use crate::cert::inspect::inspect_pem;
use crate::cert::model::{Certificate, CertificateId, CertificateView, NewCertificate};
use crate::cert::request::IssueRequest;
use crate::cert::validator::{validate, ValidatedRequest};
use crate::crypto::encryption::encrypt_key_pem;
use crate::crypto::keys::generate_key_pair;
use crate::error::{Result, StepinError};
use crate::storage::CertificateStore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info};

/// Issues certificates into a record store.
///
/// # Example
///
/// ```
/// use stepin::cert::issuer::CertificateIssuer;
/// use stepin::cert::request::IssueRequest;
/// use stepin::storage::MemoryStore;
///
/// # fn example() -> stepin::Result<()> {
/// let issuer = CertificateIssuer::new(MemoryStore::new());
///
/// let root = issuer.issue(&IssueRequest::new("root-ca", "Example Root", 10, "EC"))?;
/// let leaf = issuer.issue(
///     &IssueRequest::new("leaf", "api.example.com", 1, "EC").with_parent(root.id, None),
/// )?;
/// assert_eq!(leaf.parent_id, Some(root.id));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub struct CertificateIssuer<S> {
    store: S,
    parent_locks: Mutex<HashMap<CertificateId, Arc<Mutex<()>>>>,
}

impl<S: CertificateStore> CertificateIssuer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            parent_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check a request without issuing anything.
    pub fn validate(&self, request: &IssueRequest) -> Result<ValidatedRequest> {
        validate(&self.store, request)
    }

    /// Issue a certificate, persist its record and return its public view.
    pub fn issue(&self, request: &IssueRequest) -> Result<CertificateView> {
        let record = match request.parent_ca_id {
            Some(parent_id) => self.with_parent_lock(parent_id, || self.issue_record(request)),
            None => self.issue_record(request),
        }?;
        Ok(record.view())
    }

    fn issue_record(&self, request: &IssueRequest) -> Result<Certificate> {
        let validated = validate(&self.store, request)?;
        let certificate = build(&validated)?;
        drop(validated);

        let record = self.store.create(certificate)?;
        info!(
            id = record.id,
            profile = %record.profile,
            key_type = %record.key_type,
            parent_id = ?record.parent_id,
            encrypted = record.key_encrypted(),
            "issued certificate"
        );

        Ok(record)
    }

    fn with_parent_lock<T>(&self, parent_id: CertificateId, f: impl FnOnce() -> T) -> T {
        let lock = self.parent_lock(parent_id);
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        self.release_parent_lock(parent_id, lock);
        result
    }

    fn parent_lock(&self, parent_id: CertificateId) -> Arc<Mutex<()>> {
        let mut locks = self
            .parent_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(parent_id).or_default())
    }

    /// Drop the table entry once no other request holds it.
    fn release_parent_lock(&self, parent_id: CertificateId, lock: Arc<Mutex<()>>) {
        let mut locks = self
            .parent_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if locks
            .get(&parent_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&parent_id);
        }
    }
}

/// Generate, sign, encrypt and inspect a validated request.
fn build(validated: &ValidatedRequest) -> Result<NewCertificate> {
    let key = generate_key_pair(validated.key_type)
        .map_err(|e| StepinError::SigningFailed(e.to_string()))?;
    debug!(key_type = %validated.key_type, "generated key pair");

    let params = certificate_params(validated.profile, &validated.name, validated.years)?;
    let crt = sign(&params, &key.key_pair, &validated.signer)?.pem();
    debug!(profile = %validated.profile, "signed certificate");

    let stored_key = match &validated.passphrase {
        Some(passphrase) => encrypt_key_pem(&key.pem, passphrase).map_err(|e| {
            StepinError::SigningFailed(format!("Failed to encrypt private key: {}", e))
        })?,
        None => key.pem.to_string(),
    };

    let inspection = inspect_pem(&crt)?;

    Ok(NewCertificate {
        profile: validated.profile,
        name: validated.name.clone(),
        key_type: validated.key_type,
        crt,
        key: stored_key,
        parent_id: validated.parent().map(|parent| parent.id),
        inspection,
    })
}
