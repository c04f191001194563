//! Error types for idstate.
//!
//! All errors are strongly typed and returned to the immediate caller.
//! Nothing is retried internally. Private key material is never included
//! in error messages.

/// Identity error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Key already exists in tree: {0}")]
    DuplicateKey(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid option combination: {0}")]
    InvalidOptionCombination(String),

    #[error("Signing failed: {0}")]
    SigningFailure(String),

    #[error("Signature verification failed")]
    InvalidSignature,

    #[error("Inconsistent tree state: {0}")]
    InconsistentTreeState(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Tree depth exceeded: max {0} levels")]
    TreeDepthExceeded(usize),

    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid passphrase")]
    InvalidPassphrase,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, IdentityError>;
