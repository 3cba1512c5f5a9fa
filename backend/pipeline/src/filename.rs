//! Final filename, collision handling, and the document-date timestamp.

use std::fs::{File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{Local, NaiveDate, TimeZone};
use tracing::{info, warn};

use paperforge_core::{AnalysisResult, DocType, LanguageMode};

const DEFAULT_DOC_TYPE: &str = "Document";
const DEFAULT_SENDER: &str = "Unknown";

/// Document-type segment: English variant in `english` mode, French variant
/// otherwise. A plain string is used as-is in every mode.
pub fn doc_type_for_filename(result: &AnalysisResult, language: LanguageMode) -> String {
    let chosen = match (&result.doc_type, language) {
        (Some(DocType::SingleLanguage(s)), _) => Some(s.as_str()),
        (Some(DocType::Bilingual { en, .. }), LanguageMode::English) => en.as_deref(),
        (Some(DocType::Bilingual { fr, .. }), _) => fr.as_deref(),
        (None, _) => None,
    };
    chosen.unwrap_or(DEFAULT_DOC_TYPE).to_string()
}

/// Keep letters and digits (accented ones included), `_` and `-`; drop
/// everything else.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// `{date}_{sender}_{doctype}` without extension, plus whether the date came
/// from the document (`false` means `today` was substituted).
pub fn base_filename(
    result: &AnalysisResult,
    language: LanguageMode,
    today: NaiveDate,
) -> (String, bool) {
    let sender = result
        .sender
        .as_deref()
        .unwrap_or(DEFAULT_SENDER)
        .replace(' ', "_");
    let doc_type = doc_type_for_filename(result, language);

    let (date, from_document) = match result.doc_date.as_deref().map(sanitize_component) {
        Some(date) if !date.is_empty() => (date, true),
        _ => (today.format("%Y-%m-%d").to_string(), false),
    };

    (
        format!(
            "{date}_{}_{}",
            sanitize_component(&sender),
            sanitize_component(&doc_type)
        ),
        from_document,
    )
}

/// First free path among `base.pdf`, `base-1.pdf`, `base-2.pdf`, ...
///
/// Check-then-use: only safe with a single writer on `dir`.
pub async fn resolve_destination(dir: &Path, base: &str) -> std::io::Result<PathBuf> {
    let mut candidate = dir.join(format!("{base}.pdf"));
    let mut counter = 1u32;
    while tokio::fs::try_exists(&candidate).await? {
        warn!(path = %candidate.display(), "File already exists, appending a counter");
        candidate = dir.join(format!("{base}-{counter}.pdf"));
        counter += 1;
    }
    Ok(candidate)
}

/// Local midnight of a `YYYY-MM-DD` date.
pub fn local_midnight(raw: &str) -> Option<SystemTime> {
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    let local = Local.from_local_datetime(&midnight).earliest()?;
    Some(SystemTime::from(local))
}

/// Set access and modification time of `path` to the document date.
/// Returns whether the timestamp was applied; failures only warn.
///
/// `tokio::fs` has no `set_times`, so the syscalls run on the blocking pool.
pub async fn apply_document_date(path: &Path, raw: Option<&str>) -> bool {
    let Some(raw) = raw else {
        warn!(file = %path.display(), "No document date; leaving file timestamp untouched");
        return false;
    };
    let Some(time) = local_midnight(raw) else {
        warn!(file = %path.display(), date = %raw, "Could not parse document date; leaving file timestamp untouched");
        return false;
    };

    let target = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || {
        File::options()
            .write(true)
            .open(&target)
            .and_then(|f| f.set_times(FileTimes::new().set_accessed(time).set_modified(time)))
    })
    .await
    .unwrap_or_else(|e| Err(std::io::Error::other(e)));
    match result {
        Ok(()) => {
            info!(file = %path.display(), date = %raw, "Set file modification date");
            true
        }
        Err(e) => {
            warn!(file = %path.display(), date = %raw, error = %e, "Could not set document date");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperforge_core::Tags;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn analysis(sender: Option<&str>, date: Option<&str>, doc_type: Option<DocType>) -> AnalysisResult {
        AnalysisResult {
            doc_date: date.map(str::to_string),
            sender: sender.map(str::to_string),
            doc_type,
            tags: Some(Tags::SingleLanguage(vec![])),
            new_filename: Some("ignored.pdf".into()),
        }
    }

    #[test]
    fn english_scenario_filename() {
        let result = analysis(
            Some("Acme Corp"),
            Some("2024-03-01"),
            Some(DocType::SingleLanguage("Invoice".into())),
        );
        let (base, dated) = base_filename(&result, LanguageMode::English, today());
        assert_eq!(base, "2024-03-01_Acme_Corp_Invoice");
        assert!(dated);
    }

    #[test]
    fn bilingual_variant_follows_language_mode() {
        let doc_type = Some(DocType::Bilingual {
            en: Some("Bank Statement".into()),
            fr: Some("Relevé-bancaire".into()),
        });
        let result = analysis(Some("Desjardins"), Some("2024-05-31"), doc_type);
        assert_eq!(doc_type_for_filename(&result, LanguageMode::English), "Bank Statement");
        assert_eq!(doc_type_for_filename(&result, LanguageMode::Both), "Relevé-bancaire");
        assert_eq!(doc_type_for_filename(&result, LanguageMode::French), "Relevé-bancaire");

        let (base, _) = base_filename(&result, LanguageMode::Both, today());
        assert_eq!(base, "2024-05-31_Desjardins_Relevé-bancaire");
    }

    #[test]
    fn missing_variants_default_to_document() {
        let fr_only = analysis(None, None, Some(DocType::Bilingual { en: None, fr: Some("Reçu".into()) }));
        assert_eq!(doc_type_for_filename(&fr_only, LanguageMode::English), "Document");
        assert_eq!(doc_type_for_filename(&analysis(None, None, None), LanguageMode::Both), "Document");
    }

    #[test]
    fn missing_date_and_sender_use_defaults() {
        let (base, dated) = base_filename(&analysis(None, None, None), LanguageMode::Both, today());
        assert_eq!(base, "2025-01-15_Unknown_Document");
        assert!(!dated);
    }

    #[test]
    fn sanitization_strips_path_and_punctuation() {
        assert_eq!(sanitize_component("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_component("Bell Canada, Inc."), "BellCanadaInc");
        assert_eq!(sanitize_component("A_b-C 9"), "A_b-C9");
        let result = analysis(Some("O'Neil & Sons"), Some("2024-03-01"), None);
        let (base, _) = base_filename(&result, LanguageMode::English, today());
        assert_eq!(base, "2024-03-01_ONeil__Sons_Document");
    }

    #[test]
    fn sanitization_keeps_accented_letters() {
        assert_eq!(sanitize_component("Relevé-bancaire"), "Relevé-bancaire");
        assert_eq!(sanitize_component("Reçu"), "Reçu");
        assert_eq!(sanitize_component("Ville_de_Montréal"), "Ville_de_Montréal");
        assert_eq!(sanitize_component("Québec/../«Hydro»"), "QuébecHydro");
    }

    #[tokio::test]
    async fn collision_probing_finds_first_free_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let base = "2024-03-01_Acme_Corp_Invoice";
        assert_eq!(
            resolve_destination(dir.path(), base).await.unwrap(),
            dir.path().join(format!("{base}.pdf"))
        );

        std::fs::write(dir.path().join(format!("{base}.pdf")), b"").unwrap();
        std::fs::write(dir.path().join(format!("{base}-1.pdf")), b"").unwrap();
        assert_eq!(
            resolve_destination(dir.path(), base).await.unwrap(),
            dir.path().join(format!("{base}-2.pdf"))
        );
    }

    #[tokio::test]
    async fn document_date_sets_mtime_to_local_midnight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF").unwrap();

        assert!(apply_document_date(&path, Some("2024-03-01")).await);
        let modified = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(modified, local_midnight("2024-03-01").unwrap());
    }

    #[tokio::test]
    async fn unparseable_or_missing_date_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF").unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        assert!(!apply_document_date(&path, Some("March 1st, 2024")).await);
        assert!(!apply_document_date(&path, Some("2024-02-30")).await);
        assert!(!apply_document_date(&path, None).await);
        assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[tokio::test]
    async fn missing_file_does_not_fail_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!apply_document_date(&dir.path().join("gone.pdf"), Some("2024-03-01")).await);
    }
}
