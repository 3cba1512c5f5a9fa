pub mod analyzer;
pub mod extract;
pub mod gemini;
pub mod mock;
pub mod normalize;
pub mod ocr;
pub mod pdftotext;
pub mod prompt;

pub use analyzer::{DocumentAnalyzer, extract_json_object};
pub use extract::{ExtractedText, LocalExtraction, TextSelector, TextSource};
pub use gemini::GeminiClient;
pub use normalize::normalize;
pub use pdftotext::PdfToText;
pub use prompt::build_analysis_prompt;
