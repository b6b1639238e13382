use thiserror::Error;

/// Error taxonomy for the mapping/query/result pipeline.
///
/// Every variant carries enough text for the caller to distinguish
/// client-fixable input from server/store faults. Nothing here is retried
/// internally and nothing is logged-and-swallowed.
#[derive(Debug, Error)]
pub enum GraphmapError {
    /// Malformed mapping or endpoint configuration. Fatal at load time.
    #[error("configuration: {0}")]
    Configuration(String),

    /// Malformed projection path expression.
    #[error("projection syntax: {0}")]
    ProjectionSyntax(String),

    /// Request, template, or projection references a field or placeholder
    /// absent from the mapping model / view.
    #[error("binding mismatch: {0}")]
    BindingMismatch(String),

    /// Generated or substituted query failed local well-formedness checks.
    #[error("query compilation: {0}")]
    QueryCompilation(String),

    /// The external store rejected or failed the query. Propagated verbatim
    /// with store-provided diagnostics.
    #[error("query execution: {0}")]
    QueryExecution(String),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl GraphmapError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Configuration(_) => 500,
            Self::ProjectionSyntax(_) => 400,
            Self::BindingMismatch(_) => 400,
            Self::QueryCompilation(_) => 400,
            Self::QueryExecution(_) => 502,
            Self::Internal(_) => 500,
        }
    }

    /// True when the fault is fixable by the caller (4xx-class).
    pub fn is_client_error(&self) -> bool {
        self.http_status() < 500
    }
}

pub type Result<T> = std::result::Result<T, GraphmapError>;
