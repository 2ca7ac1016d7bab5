//! Error types for the SSH front-end.
//!
//! Transport errors are logged and the offending connection closed; the only
//! fatal errors are the startup set: bad bind address, bad host key material,
//! or a failure to seed the admin account.

use kappa_datamodel::DataModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SshError {
    #[error("empty SSH bind address")]
    EmptyBindAddress,

    #[error("invalid admin certificate: {0}")]
    InvalidAdminCertificate(String),

    #[error("could not seed admin account: {0}")]
    AdminSeed(#[from] DataModelError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Ssh(#[from] russh::Error),
}
