//! Certificate hierarchy and issuance.
//!
//! This module decides which certificates may be created under which parents
//! and carries a request through to a signed, persisted record.

pub mod builder;
pub mod download;
pub mod hierarchy;
pub mod inspect;
pub mod issuer;
pub mod model;
pub mod profile;
pub mod request;
pub mod validator;
