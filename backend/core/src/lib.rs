pub mod error;
pub mod traits;
pub mod types;

pub use error::PaperError;
pub use traits::{LlmProvider, LlmRequest, LlmResponse, OcrProvider, TextExtractor};
pub use types::{AnalysisResult, DocType, LanguageMode, NormalizedMetadata, Tags};
