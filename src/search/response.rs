//! Wire types for the Semantic Scholar paper search response.

use serde::Deserialize;

use crate::candidate::PaperCandidate;
use crate::rank::derive_pdf_url;

/// Title recorded when the API omits one.
pub const UNTITLED_PAPER: &str = "Untitled Paper";

/// Top-level search response. Only `data` is used.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub data: Option<Vec<ApiPaper>>,
}

/// One paper entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiPaper {
    pub title: Option<String>,
    pub authors: Option<Vec<ApiAuthor>>,
    pub year: Option<i32>,
    pub citation_count: Option<u64>,
    pub open_access_pdf: Option<OpenAccessPdf>,
    pub url: Option<String>,
    pub external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiAuthor {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAccessPdf {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExternalIds {
    #[serde(rename = "ArXiv")]
    pub arxiv: Option<String>,
}

impl SearchResponse {
    pub(crate) fn into_candidates(self) -> Vec<PaperCandidate> {
        self.data
            .unwrap_or_default()
            .into_iter()
            .map(ApiPaper::into_candidate)
            .collect()
    }
}

impl ApiPaper {
    pub(crate) fn into_candidate(self) -> PaperCandidate {
        let title = non_blank(self.title).unwrap_or_else(|| UNTITLED_PAPER.to_string());
        let authors = self
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|author| non_blank(author.name))
            .collect();
        let pdf_url = self.open_access_pdf.and_then(|pdf| non_blank(pdf.url));
        let arxiv_page = self
            .external_ids
            .and_then(|ids| non_blank(ids.arxiv))
            .map(|id| format!("https://arxiv.org/abs/{id}"));
        // An arXiv id beats a landing page that no PDF link can be derived from.
        let source_page_url = match non_blank(self.url) {
            Some(url) if derive_pdf_url(&url).is_some() => Some(url),
            Some(url) => arxiv_page.or(Some(url)),
            None => arxiv_page,
        };

        PaperCandidate {
            title,
            authors,
            year: self.year,
            citation_count: self.citation_count,
            pdf_url,
            source_page_url,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
