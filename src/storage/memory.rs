//! In-memory record store.

use super::recovery::plan_import;
use super::{next_id, CertificateStore};
use crate::cert::model::{Certificate, CertificateId, NewCertificate};
use crate::error::{Result, StepinError};
use chrono::Utc;
use std::sync::{Mutex, PoisonError};

/// A record store that lives for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<Certificate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CertificateStore for MemoryStore {
    fn list_all(&self) -> Result<Vec<Certificate>> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.clone())
    }

    fn get_by_id(&self, id: CertificateId) -> Result<Certificate> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records
            .iter()
            .find(|record| record.id == id)
            .cloned()
            .ok_or_else(|| StepinError::NotFound(format!("Certificate {} not found", id)))
    }

    fn create(&self, certificate: NewCertificate) -> Result<Certificate> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let record = certificate.into_certificate(next_id(&records), Utc::now());
        records.push(record.clone());
        Ok(record)
    }

    fn import(&self, incoming: Vec<Certificate>) -> Result<Vec<Certificate>> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let added = plan_import(&records, incoming)?;
        records.extend(added.iter().cloned());
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::profile::{KeyType, Profile};

    fn new_certificate(name: &str) -> NewCertificate {
        NewCertificate {
            profile: Profile::SelfSigned,
            name: name.to_string(),
            key_type: KeyType::Ec,
            crt: "crt".to_string(),
            key: "key".to_string(),
            parent_id: None,
            inspection: String::new(),
        }
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let first = store.create(new_certificate("a")).unwrap();
        let second = store.create(new_certificate("b")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_list_all_in_insertion_order() {
        let store = MemoryStore::new();
        for name in ["one", "two", "three"] {
            store.create(new_certificate(name)).unwrap();
        }

        let names: Vec<String> = store
            .list_all()
            .unwrap()
            .into_iter()
            .map(|record| record.name)
            .collect();
        assert_eq!(names, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_get_by_id() {
        let store = MemoryStore::new();
        let created = store.create(new_certificate("lookup")).unwrap();

        assert_eq!(store.get_by_id(created.id).unwrap(), created);

        match store.get_by_id(42) {
            Err(StepinError::NotFound(msg)) => assert!(msg.contains("42")),
            _ => panic!("Expected NotFound"),
        }
    }
}
