use thiserror::Error;

/// Top-level error type for the intake pipeline.
///
/// Every variant except `Staging` is raised after a document has been staged
/// and therefore routes that document to the error folder.
#[derive(Debug, Error)]
pub enum PaperError {
    #[error("no usable text from local extraction or remote OCR")]
    EmptyText,

    #[error("malformed analysis response: {reason}")]
    MalformedAnalysis { reason: String, raw: String },

    #[error("analysis service error ({provider}): {message}")]
    AnalysisService { provider: String, message: String },

    #[error("OCR service error ({provider}): {message}")]
    OcrService { provider: String, message: String },

    #[error("PDF rebuild failed with exit code {}", display_exit_code(.exit_code))]
    Rebuild {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("failed to stage {file}: {source}")]
    Staging {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_exit_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}

impl PaperError {
    /// Short machine-readable name used in structured document events.
    pub fn kind(&self) -> &'static str {
        match self {
            PaperError::EmptyText => "empty_text",
            PaperError::MalformedAnalysis { .. } => "malformed_analysis",
            PaperError::AnalysisService { .. } => "analysis_service",
            PaperError::OcrService { .. } => "ocr_service",
            PaperError::Rebuild { .. } => "rebuild",
            PaperError::Staging { .. } => "staging",
            PaperError::Config(_) => "config",
            PaperError::Io(_) => "io",
            PaperError::Other(_) => "other",
        }
    }
}
