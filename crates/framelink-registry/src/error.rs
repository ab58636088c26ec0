/// Errors from encoding or decoding a message payload.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Structured payload failed to serialize or deserialize.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from populating the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The type is already bound to a name.
    #[error("type {type_name} is already registered")]
    DuplicateType { type_name: &'static str },

    /// The name is already bound to a type.
    #[error("name {name:?} is already registered")]
    DuplicateName { name: String },

    /// The name cannot be encoded behind a one-byte length prefix.
    #[error("name too long ({len} bytes, max 255)")]
    NameTooLong { len: usize },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
