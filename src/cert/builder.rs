//! Certificate builder utilities.
//!
//! Turns a validated request into rcgen parameters and signs them either with
//! the subject's own key or with a parent CA.

use crate::cert::profile::Profile;
use crate::cert::validator::Signer;
use crate::crypto::keys::load_key_pair;
use crate::error::{Result, StepinError};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, SanType, SerialNumber,
};
use std::net::IpAddr;
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Length of generated serial numbers, in bytes.
pub const SERIAL_LENGTH: usize = 20;

/// Days per year of validity.
pub const DAYS_PER_YEAR: i64 = 365;

/// Build the parameters of a certificate for `profile`.
///
/// # Example
///
/// ```
/// use stepin::cert::builder::certificate_params;
/// use stepin::cert::profile::Profile;
///
/// let params = certificate_params(Profile::Leaf, "api.example.com", 1).unwrap();
/// assert_eq!(params.subject_alt_names.len(), 1);
/// ```
pub fn certificate_params(profile: Profile, name: &str, years: u32) -> Result<CertificateParams> {
    let mut params = CertificateParams::default();

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, name);
    params.distinguished_name = distinguished_name;

    params.serial_number = Some(random_serial());
    set_validity(&mut params, years);

    match profile {
        // No path length: intermediates may sign further intermediates.
        Profile::RootCa | Profile::IntermediateCa => {
            params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
            params.key_usages = vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::KeyCertSign,
                KeyUsagePurpose::CrlSign,
            ];
        }
        Profile::Leaf | Profile::SelfSigned => {
            params.is_ca = IsCa::NoCa;
            params.key_usages = vec![
                KeyUsagePurpose::DigitalSignature,
                KeyUsagePurpose::KeyEncipherment,
            ];
            params.extended_key_usages = vec![
                ExtendedKeyUsagePurpose::ServerAuth,
                ExtendedKeyUsagePurpose::ClientAuth,
            ];
            if let Some(san) = subject_alt_name(name) {
                params.subject_alt_names = vec![san];
            }
        }
    }

    params.use_authority_key_identifier_extension = profile.requires_parent();

    Ok(params)
}

/// SAN entry for a subject name: an IP address when it parses as one, a DNS
/// name otherwise. Names that are not IA5 strings get no SAN.
pub fn subject_alt_name(name: &str) -> Option<SanType> {
    if let Ok(ip) = name.parse::<IpAddr>() {
        return Some(SanType::IpAddress(ip));
    }

    match name.to_string().try_into() {
        Ok(dns) => Some(SanType::DnsName(dns)),
        Err(e) => {
            debug!(subject = name, error = %e, "subject name is not a valid DNS name; omitting SAN");
            None
        }
    }
}

/// Set the validity period to start now and last `years * 365` days.
pub fn set_validity(params: &mut CertificateParams, years: u32) {
    let not_before = OffsetDateTime::now_utc();
    params.not_before = not_before;
    params.not_after = not_before + Duration::days(i64::from(years) * DAYS_PER_YEAR);
}

fn random_serial() -> SerialNumber {
    let mut bytes = [0u8; SERIAL_LENGTH];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
    bytes[0] &= 0x7F; // Ensure positive

    SerialNumber::from(bytes.to_vec())
}

/// Sign `params` for `subject_key` on behalf of `signer`.
///
/// Parent signatures take the issuer name and authority key identifier from
/// the parent's certificate.
pub fn sign(params: &CertificateParams, subject_key: &KeyPair, signer: &Signer) -> Result<Certificate> {
    match signer {
        Signer::SelfSigned => params
            .self_signed(subject_key)
            .map_err(|e| StepinError::SigningFailed(format!("Failed to self-sign: {}", e))),
        Signer::Parent {
            certificate,
            key_pem,
        } => {
            let parent_key = load_key_pair(key_pem, certificate.key_type)
                .map_err(|e| StepinError::SigningFailed(e.to_string()))?;
            let issuer = Issuer::from_ca_cert_pem(&certificate.crt, parent_key).map_err(|e| {
                StepinError::SigningFailed(format!(
                    "Failed to load parent CA certificate {}: {}",
                    certificate.id, e
                ))
            })?;

            params.signed_by(subject_key, &issuer).map_err(|e| {
                StepinError::SigningFailed(format!(
                    "Failed to sign with parent CA {}: {}",
                    certificate.id, e
                ))
            })
        }
    }
}
