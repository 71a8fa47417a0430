//! Certificate inspection.
//!
//! Parses signed certificates with x509-cert and renders the text stored in
//! each record's `inspection` field.

use crate::error::{Result, StepinError};
use chrono::{DateTime, Utc};
use const_oid::db::{rfc5912, rfc8410, DB};
use const_oid::{AssociatedOid, ObjectIdentifier};
use der::Decode;
use std::fmt;
use std::net::IpAddr;
use x509_cert::certificate::{Certificate, Version};
use x509_cert::ext::pkix::name::GeneralName;
use x509_cert::ext::pkix::{BasicConstraints, SubjectAltName};
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::time::Time;

/// The fields of a certificate shown by inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectionSummary {
    pub version: u8,
    /// Colon-separated hex.
    pub serial: String,
    pub signature_algorithm: String,
    pub issuer: String,
    pub subject: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub public_key_algorithm: String,
    pub is_ca: bool,
    pub path_len: Option<u8>,
    pub subject_alt_names: Vec<String>,
}

/// Parse a PEM certificate into an [`InspectionSummary`].
pub fn parse_summary(cert_pem: &str) -> Result<InspectionSummary> {
    let cert = cert_from_pem(cert_pem)?;
    let tbs = &cert.tbs_certificate;

    let mut summary = InspectionSummary {
        version: match tbs.version {
            Version::V1 => 1,
            Version::V2 => 2,
            Version::V3 => 3,
        },
        serial: colon_hex(tbs.serial_number.as_bytes()),
        signature_algorithm: oid_name(&cert.signature_algorithm.oid),
        issuer: tbs.issuer.to_string(),
        subject: tbs.subject.to_string(),
        not_before: to_datetime(&tbs.validity.not_before)?,
        not_after: to_datetime(&tbs.validity.not_after)?,
        public_key_algorithm: public_key_algorithm(&tbs.subject_public_key_info),
        is_ca: false,
        path_len: None,
        subject_alt_names: Vec::new(),
    };

    for ext in tbs.extensions.iter().flatten() {
        if ext.extn_id == BasicConstraints::OID {
            let constraints = BasicConstraints::from_der(ext.extn_value.as_bytes()).map_err(|e| {
                StepinError::CertificateError(format!("Invalid basic constraints: {}", e))
            })?;
            summary.is_ca = constraints.ca;
            summary.path_len = constraints.path_len_constraint;
        } else if ext.extn_id == SubjectAltName::OID {
            let san = SubjectAltName::from_der(ext.extn_value.as_bytes()).map_err(|e| {
                StepinError::CertificateError(format!("Invalid subject alternative name: {}", e))
            })?;
            summary.subject_alt_names = san.0.iter().filter_map(general_name).collect();
        }
    }

    Ok(summary)
}

/// Render a summary as multi-line text.
///
/// # Example
///
/// ```
/// use stepin::cert::builder::{certificate_params, sign};
/// use stepin::cert::inspect::{parse_summary, render};
/// use stepin::cert::profile::{KeyType, Profile};
/// use stepin::cert::validator::Signer;
/// use stepin::crypto::keys::generate_key_pair;
///
/// # fn example() -> stepin::Result<()> {
/// let key = generate_key_pair(KeyType::Ec)?;
/// let params = certificate_params(Profile::RootCa, "Example Root", 10)?;
/// let cert = sign(&params, &key.key_pair, &Signer::SelfSigned)?;
///
/// let text = render(&parse_summary(&cert.pem())?);
/// assert!(text.contains("Subject: CN=Example Root"));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
pub fn render(summary: &InspectionSummary) -> String {
    summary.to_string()
}

impl fmt::Display for InspectionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Certificate:")?;
        writeln!(f, "    Data:")?;
        writeln!(
            f,
            "        Version: {} (0x{:x})",
            self.version,
            self.version.saturating_sub(1)
        )?;
        writeln!(f, "        Serial Number: {}", self.serial)?;
        writeln!(f, "    Signature Algorithm: {}", self.signature_algorithm)?;
        writeln!(f, "        Issuer: {}", self.issuer)?;
        writeln!(f, "        Validity")?;
        writeln!(f, "            Not Before: {}", format_time(&self.not_before))?;
        writeln!(f, "            Not After : {}", format_time(&self.not_after))?;
        writeln!(f, "        Subject: {}", self.subject)?;
        writeln!(f, "        Subject Public Key Info:")?;
        writeln!(f, "            Public Key Algorithm: {}", self.public_key_algorithm)?;
        writeln!(f, "        X509v3 extensions:")?;
        writeln!(f, "            X509v3 Basic Constraints: critical")?;
        match (self.is_ca, self.path_len) {
            (true, Some(path_len)) => writeln!(f, "                CA:TRUE, pathlen:{}", path_len)?,
            (true, None) => writeln!(f, "                CA:TRUE")?,
            (false, _) => writeln!(f, "                CA:FALSE")?,
        }
        if !self.subject_alt_names.is_empty() {
            writeln!(f, "            X509v3 Subject Alternative Name:")?;
            writeln!(f, "                {}", self.subject_alt_names.join(", "))?;
        }
        Ok(())
    }
}

/// Parse and render a PEM certificate.
pub fn inspect_pem(cert_pem: &str) -> Result<String> {
    parse_summary(cert_pem).map(|summary| render(&summary))
}

/// Load a Certificate from PEM format.
pub fn cert_from_pem(pem_str: &str) -> Result<Certificate> {
    let pem = pem::parse(pem_str)
        .map_err(|e| StepinError::PemError(format!("Failed to parse PEM: {}", e)))?;

    if pem.tag() != "CERTIFICATE" {
        return Err(StepinError::PemError(format!(
            "Expected CERTIFICATE, got {}",
            pem.tag()
        )));
    }

    Certificate::from_der(pem.contents())
        .map_err(|e| StepinError::CertificateError(format!("Failed to decode certificate: {}", e)))
}

fn to_datetime(time: &Time) -> Result<DateTime<Utc>> {
    let secs = time.to_unix_duration().as_secs();
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or_else(|| StepinError::CertificateError(format!("Time out of range: {}", secs)))
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%b %e %H:%M:%S %Y UTC").to_string()
}

fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| hex::encode([*byte]))
        .collect::<Vec<_>>()
        .join(":")
}

fn oid_name(oid: &ObjectIdentifier) -> String {
    DB.by_oid(oid)
        .map(str::to_string)
        .unwrap_or_else(|| oid.to_string())
}

fn public_key_algorithm(spki: &SubjectPublicKeyInfoOwned) -> String {
    let oid = &spki.algorithm.oid;
    if *oid == rfc5912::ID_EC_PUBLIC_KEY {
        let curve = spki
            .algorithm
            .parameters
            .as_ref()
            .and_then(|params| params.decode_as::<ObjectIdentifier>().ok());
        match curve {
            Some(curve) if curve == rfc5912::SECP_256_R_1 => "ECDSA P-256".to_string(),
            Some(curve) if curve == rfc5912::SECP_384_R_1 => "ECDSA P-384".to_string(),
            Some(curve) => format!("ECDSA {}", oid_name(&curve)),
            None => "ECDSA".to_string(),
        }
    } else if *oid == rfc8410::ID_ED_25519 {
        "Ed25519".to_string()
    } else if *oid == rfc5912::RSA_ENCRYPTION {
        let bits = rsa_modulus_bits(spki.subject_public_key.raw_bytes());
        match bits {
            Some(bits) => format!("RSA ({} bit)", bits),
            None => "RSA".to_string(),
        }
    } else {
        oid_name(oid)
    }
}

fn rsa_modulus_bits(public_key_der: &[u8]) -> Option<usize> {
    use rsa::pkcs1::DecodeRsaPublicKey;
    use rsa::traits::PublicKeyParts;

    rsa::RsaPublicKey::from_pkcs1_der(public_key_der)
        .ok()
        .map(|key| key.n().bits())
}

fn general_name(name: &GeneralName) -> Option<String> {
    match name {
        GeneralName::DnsName(dns) => Some(format!("DNS:{}", dns)),
        GeneralName::IpAddress(octets) => {
            let ip = match octets.as_bytes().len() {
                4 => <[u8; 4]>::try_from(octets.as_bytes()).ok().map(IpAddr::from),
                16 => <[u8; 16]>::try_from(octets.as_bytes()).ok().map(IpAddr::from),
                _ => None,
            }?;
            Some(format!("IP Address:{}", ip))
        }
        _ => None,
    }
}
