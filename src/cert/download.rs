//! Download of certificate material.
//!
//! CA private keys are never handed out; only signing reads them.

use crate::cert::hierarchy::chain;
use crate::cert::model::CertificateId;
use crate::error::{Result, StepinError};
use crate::storage::CertificateStore;
use std::fmt;
use std::str::FromStr;

/// What to download for a certificate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    /// The PEM certificate.
    Crt,
    /// The stored private key, encrypted or not.
    Key,
    /// The certificate followed by its ancestors.
    Chain,
}

impl DownloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadKind::Crt => "crt",
            DownloadKind::Key => "key",
            DownloadKind::Chain => "chain",
        }
    }
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DownloadKind {
    type Err = StepinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "crt" => Ok(DownloadKind::Crt),
            "key" => Ok(DownloadKind::Key),
            "chain" => Ok(DownloadKind::Chain),
            other => Err(StepinError::InvalidDownloadType(other.to_string())),
        }
    }
}

/// A file ready to hand to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Attachment name, `<name>.<kind>` with path separators replaced.
    pub filename: String,
    pub contents: Vec<u8>,
}

/// Fetch certificate material for download.
///
/// # Example
///
/// ```
/// use stepin::cert::download::{download, DownloadKind};
/// use stepin::cert::issuer::CertificateIssuer;
/// use stepin::cert::request::IssueRequest;
/// use stepin::storage::MemoryStore;
/// use stepin::StepinError;
///
/// # fn example() -> stepin::Result<()> {
/// let issuer = CertificateIssuer::new(MemoryStore::new());
/// let root = issuer.issue(&IssueRequest::new("root-ca", "Root", 10, "EC"))?;
///
/// let crt = download(issuer.store(), root.id, DownloadKind::Crt)?;
/// assert_eq!(crt.filename, "Root.crt");
/// assert!(matches!(
///     download(issuer.store(), root.id, DownloadKind::Key),
///     Err(StepinError::Forbidden(_))
/// ));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub fn download<S: CertificateStore + ?Sized>(
    store: &S,
    id: CertificateId,
    kind: DownloadKind,
) -> Result<Download> {
    let certificate = store.get_by_id(id)?;

    let contents = match kind {
        DownloadKind::Crt => certificate.crt.clone(),
        DownloadKind::Key => {
            if certificate.is_ca() {
                return Err(StepinError::Forbidden(format!(
                    "Private key of {} certificate {} cannot be downloaded",
                    certificate.profile, certificate.id
                )));
            }
            certificate.key.clone()
        }
        DownloadKind::Chain => {
            let certificates = chain(store, id)?;
            let pems: Vec<&str> = certificates.iter().map(|c| c.crt.as_str()).collect();
            chain_pem(&pems)
        }
    };

    Ok(Download {
        filename: attachment_name(&certificate.name, kind),
        contents: contents.into_bytes(),
    })
}

/// A file name for `name` that stays inside whatever directory it lands in.
fn attachment_name(name: &str, kind: DownloadKind) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    format!("{}.{}", stem, kind)
}

/// Concatenate PEM certificates into a bundle, one block after another.
pub fn chain_pem(certificates: &[&str]) -> String {
    certificates
        .iter()
        .map(|pem| pem.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::model::NewCertificate;
    use crate::cert::profile::{KeyType, Profile};
    use crate::storage::MemoryStore;

    fn add(
        store: &MemoryStore,
        profile: Profile,
        name: &str,
        parent_id: Option<CertificateId>,
    ) -> CertificateId {
        store
            .create(NewCertificate {
                profile,
                name: name.to_string(),
                key_type: KeyType::Ec,
                crt: format!("-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n", name),
                key: format!("key of {}", name),
                parent_id,
                inspection: String::new(),
            })
            .unwrap()
            .id
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("crt".parse::<DownloadKind>().unwrap(), DownloadKind::Crt);
        assert_eq!("key".parse::<DownloadKind>().unwrap(), DownloadKind::Key);
        assert_eq!("chain".parse::<DownloadKind>().unwrap(), DownloadKind::Chain);
        match "pfx".parse::<DownloadKind>() {
            Err(StepinError::InvalidDownloadType(value)) => assert_eq!(value, "pfx"),
            other => panic!("Expected InvalidDownloadType, got {:?}", other),
        }
    }

    #[test]
    fn test_key_download_forbidden_for_cas() {
        let store = MemoryStore::new();
        let root = add(&store, Profile::RootCa, "root", None);
        let intermediate = add(&store, Profile::IntermediateCa, "issuing", Some(root));

        for id in [root, intermediate] {
            match download(&store, id, DownloadKind::Key) {
                Err(StepinError::Forbidden(msg)) => assert!(msg.contains("cannot be downloaded")),
                other => panic!("Expected Forbidden, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_key_download_for_end_entities() {
        let store = MemoryStore::new();
        let root = add(&store, Profile::RootCa, "root", None);
        let leaf = add(&store, Profile::Leaf, "web", Some(root));
        let self_signed = add(&store, Profile::SelfSigned, "dev", None);

        let key = download(&store, leaf, DownloadKind::Key).unwrap();
        assert_eq!(key.filename, "web.key");
        assert_eq!(key.contents, b"key of web");

        assert!(download(&store, self_signed, DownloadKind::Key).is_ok());
    }

    #[test]
    fn test_chain_download() {
        let store = MemoryStore::new();
        let root = add(&store, Profile::RootCa, "root", None);
        let intermediate = add(&store, Profile::IntermediateCa, "issuing", Some(root));
        let leaf = add(&store, Profile::Leaf, "web", Some(intermediate));

        let bundle = download(&store, leaf, DownloadKind::Chain).unwrap();
        let text = String::from_utf8(bundle.contents).unwrap();

        assert_eq!(bundle.filename, "web.chain");
        assert_eq!(text.matches("BEGIN CERTIFICATE").count(), 3);
        let web = text.find("\nweb\n").unwrap();
        let issuing = text.find("\nissuing\n").unwrap();
        let root_pos = text.find("\nroot\n").unwrap();
        assert!(web < issuing && issuing < root_pos);
    }

    #[test]
    fn test_filename_has_no_path_separators() {
        let store = MemoryStore::new();
        let root = add(&store, Profile::RootCa, "root", None);
        let sneaky = add(&store, Profile::Leaf, "../../etc/x", Some(root));
        let windows = add(&store, Profile::Leaf, "..\\up", Some(root));

        let key = download(&store, sneaky, DownloadKind::Key).unwrap();
        assert_eq!(key.filename, ".._.._etc_x.key");
        let crt = download(&store, windows, DownloadKind::Crt).unwrap();
        assert_eq!(crt.filename, ".._up.crt");
    }

    #[test]
    fn test_download_unknown_id() {
        let store = MemoryStore::new();
        assert!(matches!(
            download(&store, 1, DownloadKind::Crt),
            Err(StepinError::NotFound(_))
        ));
    }
}
