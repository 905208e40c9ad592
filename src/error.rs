//! Error taxonomy shared by every stage of the report pipeline.

use thiserror::Error;

use crate::registry::ChartStatus;

/// Convenience alias used throughout the crate.
pub type Result<T, E = ReportError> = std::result::Result<T, E>;

/// Failures surfaced by the report pipeline.
///
/// Collaborator faults are never retried inside the crate; callers can consult
/// [`ReportError::is_retryable`] to decide whether to try again.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A category, chart type, language or other argument was rejected.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// There were no records to build a document from.
    #[error("no subject records available")]
    EmptyInput,

    #[error("record source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("translation unavailable: {0}")]
    TranslationUnavailable(String),

    #[error("analysis unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("rendering failed: {0}")]
    RenderFailure(String),

    #[error("store failure: {0}")]
    StoreFailure(String),

    /// Two callers raced for the same version of a chart type.
    #[error("version {version} already claimed for chart type '{chart_type}'")]
    VersionConflict { chart_type: String, version: u32 },

    /// A translation or analysis call failed while a document was being assembled.
    #[error("document dependency failed: {0}")]
    RenderDependency(#[source] Box<ReportError>),

    #[error("chart '{0}' not found")]
    NotFound(String),

    /// The artifact already reached a terminal status.
    #[error("chart '{key}' was already finalized as {status}")]
    AlreadyFinalized { key: String, status: ChartStatus },

    /// Metadata was removed but the stored document could not be.
    #[error("chart '{key}' metadata deleted but stored document remains: {reason}")]
    InconsistentDelete { key: String, reason: String },
}

impl ReportError {
    /// Wraps a collaborator failure raised during document assembly.
    pub fn dependency(err: ReportError) -> Self {
        match err {
            already @ ReportError::RenderDependency(_) => already,
            other => ReportError::RenderDependency(Box::new(other)),
        }
    }

    /// Returns `true` for collaborator faults and version races.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReportError::SourceUnavailable(_)
            | ReportError::TranslationUnavailable(_)
            | ReportError::AnalysisUnavailable(_)
            | ReportError::RenderFailure(_)
            | ReportError::StoreFailure(_)
            | ReportError::VersionConflict { .. }
            | ReportError::InconsistentDelete { .. } => true,
            ReportError::RenderDependency(inner) => inner.is_retryable(),
            ReportError::InvalidArgument(_)
            | ReportError::EmptyInput
            | ReportError::NotFound(_)
            | ReportError::AlreadyFinalized { .. } => false,
        }
    }
}

impl From<genpdf::error::Error> for ReportError {
    fn from(err: genpdf::error::Error) -> Self {
        ReportError::RenderFailure(err.to_string())
    }
}

impl From<zip::result::ZipError> for ReportError {
    fn from(err: zip::result::ZipError) -> Self {
        ReportError::RenderFailure(format!("archive write failed: {err}"))
    }
}
