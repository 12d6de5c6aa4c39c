/// Errors from decoding a tagged column value.
#[derive(Debug)]
pub enum CodecError {
    /// A column tagged object/array did not hold parseable JSON.
    Json(serde_json::Error),
    /// The raw driver value cannot carry the tagged encoding (e.g. a number
    /// where JSON text was expected).
    UnexpectedRaw { tag: &'static str },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Json(err) => write!(f, "Tagged column holds invalid JSON: {err}"),
            CodecError::UnexpectedRaw { tag } => {
                write!(f, "Raw value cannot carry a {tag}-tagged encoding")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Json(err) => Some(err),
            CodecError::UnexpectedRaw { .. } => None,
        }
    }
}

/// Errors from rebuilding an entity out of a result row.
#[derive(Debug)]
pub enum MarshalError {
    Column { column: String, source: CodecError },
}

impl std::fmt::Display for MarshalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarshalError::Column { column, source } => {
                write!(f, "Failed to decode column '{column}': {source}")
            }
        }
    }
}

impl std::error::Error for MarshalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MarshalError::Column { source, .. } => Some(source),
        }
    }
}

/// Errors from statement synthesis.
#[derive(Debug)]
pub enum StatementError {
    InvalidIdentifier { kind: &'static str, ident: String },
    /// Update requires an id.
    MissingId { table: String },
    /// A delete with no filters is refused unless bulk intent is explicit.
    UnboundedDelete { table: String },
}

impl std::fmt::Display for StatementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
            StatementError::MissingId { table } => {
                write!(f, "Update on table '{table}' requires an entity id")
            }
            StatementError::UnboundedDelete { table } => {
                write!(
                    f,
                    "Refusing delete on table '{table}' with no filters; set bulk intent to remove every row"
                )
            }
        }
    }
}

impl std::error::Error for StatementError {}
