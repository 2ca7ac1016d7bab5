//! Error types for the data model.

use kappa_store::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataModelError>;

#[derive(Debug, Error)]
pub enum DataModelError {
    #[error("user does not exist")]
    UserDoesNotExist,

    #[error("namespace does not exist")]
    NamespaceDoesNotExist,

    /// Empty names and names containing the key separator are rejected.
    #[error("invalid name: {0:?}")]
    InvalidName(String),

    #[error("invalid certificate")]
    InvalidCertificate,

    #[error("failed public key conversion")]
    FailedKeyConversion,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
