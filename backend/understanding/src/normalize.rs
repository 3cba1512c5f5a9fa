//! Reconcile an [`AnalysisResult`] into the four PDF document-info strings.

use std::collections::HashSet;

use paperforge_core::{AnalysisResult, DocType, NormalizedMetadata, Tags};

pub const DEFAULT_TITLE: &str = "Document";
pub const DEFAULT_SENDER: &str = "Unknown";

pub fn normalize(result: &AnalysisResult) -> NormalizedMetadata {
    let title = title_for(result.doc_type.as_ref());
    let author = result
        .sender
        .clone()
        .unwrap_or_else(|| DEFAULT_SENDER.to_string());
    let subject = format!("{author} - {title}");
    let keywords = keywords_for(result.tags.as_ref());

    NormalizedMetadata {
        title,
        author,
        subject,
        keywords,
    }
}

fn title_for(doc_type: Option<&DocType>) -> String {
    match doc_type {
        Some(DocType::SingleLanguage(s)) => s.clone(),
        Some(DocType::Bilingual { en, fr }) => format!(
            "{} / {}",
            en.as_deref().unwrap_or_default(),
            fr.as_deref().unwrap_or_default()
        ),
        None => DEFAULT_TITLE.to_string(),
    }
}

fn keywords_for(tags: Option<&Tags>) -> String {
    let all: Vec<&String> = match tags {
        Some(Tags::SingleLanguage(list)) => list.iter().collect(),
        Some(Tags::Bilingual { en, fr }) => en.iter().chain(fr.iter()).collect(),
        None => Vec::new(),
    };

    let mut seen = HashSet::new();
    all.into_iter()
        .filter(|tag| seen.insert(tag.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
