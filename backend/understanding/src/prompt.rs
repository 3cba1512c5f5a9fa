//! Analysis prompt construction, one variant per output language mode.

use paperforge_core::LanguageMode;

const BASE_INSTRUCTIONS: &str = "\
You are an expert document analysis AI. Based *only* on the text provided, perform these actions:
1.  **Extract Document Date**: Find the main date of the document. Format it as YYYY-MM-DD. If no date is found, return null.
2.  **Identify Sender**: Determine the sender or primary entity.
";

const BOTH_INSTRUCTIONS: &str = "\
3.  **Identify Document Type**: Determine the document type in both English and Quebecois French.
4.  **Generate Keywords**: Generate a concise list of 5-7 relevant keywords in BOTH English and Quebecois French.
5.  **Create Filename**: Propose a new filename using the Quebecois French document type and the extracted document date, like 'YYYY-MM-DD_Sender_DocTypeFR.pdf'.

Return ONLY a single, valid JSON object with the keys \"doc_date\", \"doc_type\" (as an object with \"en\" and \"fr\" keys), \"sender\", \"tags\" (as an object with \"en\" and \"fr\" keys, each a list of strings), and \"new_filename\".
";

const FRENCH_INSTRUCTIONS: &str = "\
3.  **Identify Document Type**: Determine the document type in Quebecois French. If it contains multiple words, separate them with hyphens.
4.  **Generate Keywords**: Generate a concise list of 5-7 relevant keywords in Quebecois French.
5.  **Create Filename**: Propose a new filename using the Quebecois French document type and the extracted document date, like 'YYYY-MM-DD_Sender_DocTypeFR.pdf'.

Return ONLY a single, valid JSON object with the keys \"doc_date\", \"doc_type\" (as a string), \"sender\", \"tags\" (as a list of strings), and \"new_filename\".
";

const ENGLISH_INSTRUCTIONS: &str = "\
3.  **Identify Document Type**: Determine the document type in English.
4.  **Generate Keywords**: Generate a concise list of 5-7 relevant keywords in English.
5.  **Create Filename**: Propose a new filename using the English document type and the extracted document date, like 'YYYY-MM-DD_Sender_DocTypeEN.pdf'.

Return ONLY a single, valid JSON object with the keys \"doc_date\", \"doc_type\" (as a string), \"sender\", \"tags\" (as a list of strings), and \"new_filename\".
";

/// Build the full analysis prompt, document text included.
pub fn build_analysis_prompt(language: LanguageMode, text: &str) -> String {
    let language_instructions = match language {
        LanguageMode::Both => BOTH_INSTRUCTIONS,
        LanguageMode::French => FRENCH_INSTRUCTIONS,
        LanguageMode::English => ENGLISH_INSTRUCTIONS,
    };
    format!("{BASE_INSTRUCTIONS}{language_instructions}\nDOCUMENT TEXT:\n\"{text}\"")
}
