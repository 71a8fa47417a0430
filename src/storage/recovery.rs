//! Plain JSON export and recovery import of certificate records.
//!
//! An export is a JSON array of records exactly as the store holds them.
//! Encrypted private keys stay encrypted; the database seal, if any, is not
//! applied, so an export of a sealed store is readable JSON.
//!
//! Recovery appends exported records to a store while keeping their ids, so
//! `parentID` links survive the round trip. Records already present with
//! identical contents are skipped, which makes a repeated import a no-op.

use super::CertificateStore;
use crate::cert::model::{Certificate, CertificateId};
use crate::error::{Result, StepinError};
use std::collections::HashMap;

/// Serialize every record of `store` as a pretty-printed JSON array.
///
/// # Example
///
/// ```
/// use stepin::cert::issuer::CertificateIssuer;
/// use stepin::cert::request::IssueRequest;
/// use stepin::storage::recovery::{export_json, parse_export};
/// use stepin::storage::{CertificateStore, MemoryStore};
///
/// # fn example() -> stepin::Result<()> {
/// let issuer = CertificateIssuer::new(MemoryStore::new());
/// issuer.issue(&IssueRequest::new("root-ca", "Root", 10, "EC"))?;
///
/// let json = export_json(issuer.store())?;
/// let restored = MemoryStore::new();
/// restored.import(parse_export(&json)?)?;
/// assert_eq!(restored.list_all()?, issuer.store().list_all()?);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub fn export_json<S: CertificateStore + ?Sized>(store: &S) -> Result<String> {
    let records = store.list_all()?;
    serde_json::to_string_pretty(&records).map_err(StepinError::JsonError)
}

/// Parse an export produced by [`export_json`].
pub fn parse_export(json: &str) -> Result<Vec<Certificate>> {
    serde_json::from_str(json).map_err(|e| {
        StepinError::InvalidImport(format!("Export is not a certificate list: {}", e))
    })
}

/// Decide which of `incoming` to append after `existing`.
///
/// Incoming ids must be strictly increasing. A record whose id is already
/// present must match the stored record exactly and is skipped. Every other
/// record must sort after the last stored id and keep the parent rules of its
/// profile, with its parent a CA record that precedes it.
pub(crate) fn plan_import(
    existing: &[Certificate],
    incoming: Vec<Certificate>,
) -> Result<Vec<Certificate>> {
    let mut known: HashMap<CertificateId, &Certificate> =
        existing.iter().map(|record| (record.id, record)).collect();
    let mut last_id = existing.last().map_or(0, |record| record.id);
    let mut previous_incoming = 0;
    let mut accepted = Vec::new();

    for record in &incoming {
        if record.id <= previous_incoming {
            return Err(StepinError::InvalidImport(format!(
                "Certificate ids must be strictly increasing, found {} after {}",
                record.id, previous_incoming
            )));
        }
        previous_incoming = record.id;

        if let Some(stored) = known.get(&record.id) {
            if *stored != record {
                return Err(StepinError::InvalidImport(format!(
                    "Certificate {} conflicts with the stored record",
                    record.id
                )));
            }
            continue;
        }

        if record.id <= last_id {
            return Err(StepinError::InvalidImport(format!(
                "Certificate {} would be inserted before existing record {}",
                record.id, last_id
            )));
        }

        match (record.profile.requires_parent(), record.parent_id) {
            (true, None) => {
                return Err(StepinError::InvalidImport(format!(
                    "{} certificate {} has no parent",
                    record.profile, record.id
                )))
            }
            (false, Some(_)) => {
                return Err(StepinError::InvalidImport(format!(
                    "{} certificate {} must not have a parent",
                    record.profile, record.id
                )))
            }
            (true, Some(parent_id)) => match known.get(&parent_id) {
                Some(parent) if parent.is_ca() => {}
                _ => {
                    return Err(StepinError::InvalidImport(format!(
                        "Parent {} of certificate {} is not a preceding CA record",
                        parent_id, record.id
                    )))
                }
            },
            (false, None) => {}
        }

        last_id = record.id;
        known.insert(record.id, record);
        accepted.push(record.id);
    }

    Ok(incoming
        .into_iter()
        .filter(|record| accepted.contains(&record.id))
        .collect())
}
