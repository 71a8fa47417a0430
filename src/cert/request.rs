//! Issuance requests as received from callers.

use crate::cert::model::CertificateId;
use serde::{Deserialize, Serialize};

/// A request to issue a new certificate.
///
/// `profile` and `key_type` stay raw strings so unknown values reach the
/// hierarchy validator and are rejected with their own error variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub profile: String,
    pub name: String,

    /// Passphrase protecting the new private key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass: Option<String>,
    pub years: i64,
    pub key_type: String,

    #[serde(rename = "parentCaID", default, skip_serializing_if = "Option::is_none")]
    pub parent_ca_id: Option<CertificateId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ca_password: Option<String>,
}

impl IssueRequest {
    /// Create a request with the required fields; the optional ones start empty.
    ///
    /// # Example
    ///
    /// ```
    /// use stepin::cert::request::IssueRequest;
    ///
    /// let request = IssueRequest::new("leaf", "api.example.com", 1, "EC")
    ///     .with_parent(1, Some("ca-passphrase"));
    /// assert_eq!(request.parent_ca_id, Some(1));
    /// ```
    pub fn new(profile: &str, name: &str, years: i64, key_type: &str) -> Self {
        Self {
            profile: profile.to_string(),
            name: name.to_string(),
            years,
            key_type: key_type.to_string(),
            ..Self::default()
        }
    }

    pub fn with_pass(mut self, pass: &str) -> Self {
        self.pass = Some(pass.to_string());
        self
    }

    pub fn with_parent(mut self, parent_id: CertificateId, password: Option<&str>) -> Self {
        self.parent_ca_id = Some(parent_id);
        self.parent_ca_password = password.map(str::to_string);
        self
    }

    /// The passphrase for the new key, if one was supplied and is non-empty.
    pub fn passphrase(&self) -> Option<&str> {
        self.pass.as_deref().filter(|pass| !pass.is_empty())
    }
}
