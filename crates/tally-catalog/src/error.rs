use tally_types::TypeError;

/// Errors from catalog loading and lookups.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The backing source could not be read.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// The catalog loaded but has no usable methods.
    #[error("catalog has no usable payment methods")]
    Empty,

    /// A record used a type string outside every known vocabulary.
    #[error("unknown payment type '{0}'")]
    UnknownKind(String),

    /// A record failed validation.
    #[error("invalid catalog record '{id}': {reason}")]
    InvalidRecord { id: String, reason: String },

    /// The catalog document could not be parsed.
    #[error("catalog parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
