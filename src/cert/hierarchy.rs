//! Queries over the certificate tree.
//!
//! Relationships come only from `parent_id` links; names play no part.

use crate::cert::model::{Certificate, CertificateId};
use crate::error::{Result, StepinError};
use crate::storage::CertificateStore;

/// Records that may sign new certificates, in insertion order.
pub fn parent_candidates<S: CertificateStore + ?Sized>(store: &S) -> Result<Vec<Certificate>> {
    Ok(store
        .list_all()?
        .into_iter()
        .filter(Certificate::is_ca)
        .collect())
}

/// The certificate followed by each of its ancestors up to the root.
///
/// # Example
///
/// ```
/// use stepin::cert::hierarchy::chain;
/// use stepin::cert::issuer::CertificateIssuer;
/// use stepin::cert::request::IssueRequest;
/// use stepin::storage::MemoryStore;
///
/// # fn example() -> stepin::Result<()> {
/// let issuer = CertificateIssuer::new(MemoryStore::new());
/// let root = issuer.issue(&IssueRequest::new("root-ca", "Root", 10, "OKP"))?;
/// let leaf = issuer.issue(
///     &IssueRequest::new("leaf", "svc.internal", 1, "OKP").with_parent(root.id, None),
/// )?;
///
/// let ids: Vec<u64> = chain(issuer.store(), leaf.id)?.iter().map(|c| c.id).collect();
/// assert_eq!(ids, vec![leaf.id, root.id]);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub fn chain<S: CertificateStore + ?Sized>(
    store: &S,
    id: CertificateId,
) -> Result<Vec<Certificate>> {
    let mut current = store.get_by_id(id)?;
    let mut certificates = Vec::new();

    while let Some(parent_id) = current.parent_id {
        // Parents always predate their children, so ids strictly decrease.
        if parent_id >= current.id {
            return Err(StepinError::CertificateError(format!(
                "Certificate {} references parent {} which is not older",
                current.id, parent_id
            )));
        }
        let parent = store.get_by_id(parent_id)?;
        certificates.push(current);
        current = parent;
    }
    certificates.push(current);

    Ok(certificates)
}

/// Records directly signed by `id`, in insertion order.
pub fn children<S: CertificateStore + ?Sized>(
    store: &S,
    id: CertificateId,
) -> Result<Vec<Certificate>> {
    store.get_by_id(id)?;
    Ok(store
        .list_all()?
        .into_iter()
        .filter(|certificate| certificate.parent_id == Some(id))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::model::NewCertificate;
    use crate::cert::profile::{KeyType, Profile};
    use crate::storage::MemoryStore;

    fn add(store: &MemoryStore, profile: Profile, parent_id: Option<CertificateId>) -> CertificateId {
        store
            .create(NewCertificate {
                profile,
                name: profile.to_string(),
                key_type: KeyType::Ec,
                crt: String::new(),
                key: String::new(),
                parent_id,
                inspection: String::new(),
            })
            .unwrap()
            .id
    }

    fn tree() -> (MemoryStore, [CertificateId; 5]) {
        let store = MemoryStore::new();
        let root = add(&store, Profile::RootCa, None);
        let intermediate = add(&store, Profile::IntermediateCa, Some(root));
        let leaf = add(&store, Profile::Leaf, Some(intermediate));
        let direct_leaf = add(&store, Profile::Leaf, Some(root));
        let self_signed = add(&store, Profile::SelfSigned, None);
        (store, [root, intermediate, leaf, direct_leaf, self_signed])
    }

    fn ids(certificates: &[Certificate]) -> Vec<CertificateId> {
        certificates.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_parent_candidates() {
        let (store, [root, intermediate, ..]) = tree();
        assert_eq!(
            ids(&parent_candidates(&store).unwrap()),
            vec![root, intermediate]
        );
    }

    #[test]
    fn test_chain_walks_to_root() {
        let (store, [root, intermediate, leaf, _, self_signed]) = tree();

        assert_eq!(ids(&chain(&store, leaf).unwrap()), vec![leaf, intermediate, root]);
        assert_eq!(ids(&chain(&store, root).unwrap()), vec![root]);
        assert_eq!(ids(&chain(&store, self_signed).unwrap()), vec![self_signed]);
    }

    #[test]
    fn test_chain_unknown_id() {
        let (store, _) = tree();
        assert!(matches!(chain(&store, 100), Err(StepinError::NotFound(_))));
    }

    #[test]
    fn test_children() {
        let (store, [root, intermediate, leaf, direct_leaf, _]) = tree();

        assert_eq!(ids(&children(&store, root).unwrap()), vec![intermediate, direct_leaf]);
        assert_eq!(ids(&children(&store, intermediate).unwrap()), vec![leaf]);
        assert!(children(&store, leaf).unwrap().is_empty());
        assert!(matches!(children(&store, 100), Err(StepinError::NotFound(_))));
    }
}
