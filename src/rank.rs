//! Candidate eligibility, ordering and truncation.
//!
//! A candidate is eligible when it has a usable http(s) PDF link, either
//! given directly or derived from a recognized landing page. Eligible
//! candidates are de-duplicated by link and ordered by citation count
//! (missing counts rank as zero, ties keep search order).

use std::cmp::Reverse;
use std::collections::HashSet;

use tracing::debug;
use url::Url;

use crate::candidate::PaperCandidate;

/// Eligible and unavailable candidates, each in their own order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedCandidates {
    /// Ordered candidates with a resolved `pdf_url`.
    pub eligible: Vec<PaperCandidate>,
    /// Candidates without any usable link, in search order.
    pub unavailable: Vec<PaperCandidate>,
}

/// Splits candidates into eligible and unavailable, de-duplicates and
/// orders the eligible ones.
///
/// Duplicate links keep the first occurrence in search order; later
/// duplicates are dropped rather than reported.
#[must_use]
pub fn partition_candidates(
    candidates: &[PaperCandidate],
    order_by_citations: bool,
) -> RankedCandidates {
    let mut seen_urls = HashSet::new();
    let mut ranked = RankedCandidates::default();

    for candidate in candidates {
        match resolve_pdf_url(candidate) {
            Some(url) => {
                if !seen_urls.insert(url.clone()) {
                    debug!(title = %candidate.title, %url, "dropping duplicate PDF link");
                    continue;
                }
                let mut candidate = candidate.clone();
                candidate.pdf_url = Some(url);
                ranked.eligible.push(candidate);
            }
            None => ranked.unavailable.push(candidate.clone()),
        }
    }

    if order_by_citations {
        // sort_by_key is stable, so equal counts keep search order
        ranked
            .eligible
            .sort_by_key(|c| Reverse(c.citation_count.unwrap_or(0)));
    }

    ranked
}

/// Returns at most `max_count` eligible candidates, best first.
#[must_use]
pub fn select_top_candidates(
    candidates: &[PaperCandidate],
    max_count: usize,
    order_by_citations: bool,
) -> Vec<PaperCandidate> {
    let mut eligible = partition_candidates(candidates, order_by_citations).eligible;
    eligible.truncate(max_count);
    eligible
}

/// Usable PDF link for `candidate`, if one exists or can be derived.
///
/// A direct `pdf_url` wins. A non-http(s) direct link makes the candidate
/// ineligible. Otherwise arXiv and IACR ePrint landing pages are mapped
/// to their PDF form.
#[must_use]
pub fn resolve_pdf_url(candidate: &PaperCandidate) -> Option<String> {
    if let Some(direct) = candidate.pdf_url.as_deref() {
        return is_http_url(direct).then(|| direct.trim().to_string());
    }
    candidate
        .source_page_url
        .as_deref()
        .and_then(derive_pdf_url)
}

/// Maps a known landing page URL to its PDF URL.
///
/// - `https://arxiv.org/abs/<id>` becomes `https://arxiv.org/pdf/<id>.pdf`
/// - `https://eprint.iacr.org/<year>/<n>` becomes `https://eprint.iacr.org/<year>/<n>.pdf`
#[must_use]
pub fn derive_pdf_url(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let path = parsed.path().trim_end_matches('/');

    if host == "arxiv.org" || host.ends_with(".arxiv.org") {
        let id = path.strip_prefix("/abs/")?;
        if id.is_empty() {
            return None;
        }
        let id = id.strip_suffix(".pdf").unwrap_or(id);
        return Some(format!("https://arxiv.org/pdf/{id}.pdf"));
    }

    if host == "eprint.iacr.org" {
        let mut segments = path.trim_start_matches('/').split('/');
        let year = segments.next()?;
        let number = segments.next()?;
        let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
        if segments.next().is_none() && is_digits(year) && is_digits(number) {
            return Some(format!("https://eprint.iacr.org/{year}/{number}.pdf"));
        }
    }

    None
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw.trim()).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, citations: Option<u64>, pdf: Option<&str>) -> PaperCandidate {
        let mut candidate = PaperCandidate::new(title);
        candidate.citation_count = citations;
        candidate.pdf_url = pdf.map(ToString::to_string);
        candidate
    }

    fn titles(candidates: &[PaperCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.title.as_str()).collect()
    }

    #[test]
    fn test_orders_by_citations_descending() {
        let candidates = vec![
            paper("low", Some(1), Some("https://a.org/1.pdf")),
            paper("high", Some(90), Some("https://a.org/2.pdf")),
            paper("mid", Some(40), Some("https://a.org/3.pdf")),
        ];
        let top = select_top_candidates(&candidates, 10, true);
        assert_eq!(titles(&top), vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_missing_citations_rank_as_zero_and_ties_keep_order() {
        let candidates = vec![
            paper("none-a", None, Some("https://a.org/1.pdf")),
            paper("zero", Some(0), Some("https://a.org/2.pdf")),
            paper("five", Some(5), Some("https://a.org/3.pdf")),
            paper("none-b", None, Some("https://a.org/4.pdf")),
        ];
        let top = select_top_candidates(&candidates, 10, true);
        assert_eq!(titles(&top), vec!["five", "none-a", "zero", "none-b"]);
    }

    #[test]
    fn test_search_order_kept_when_ordering_disabled() {
        let candidates = vec![
            paper("first", Some(1), Some("https://a.org/1.pdf")),
            paper("second", Some(100), Some("https://a.org/2.pdf")),
        ];
        let top = select_top_candidates(&candidates, 10, false);
        assert_eq!(titles(&top), vec!["first", "second"]);
    }

    #[test]
    fn test_truncates_to_max_count() {
        let candidates = vec![
            paper("a", Some(3), Some("https://a.org/1.pdf")),
            paper("b", Some(2), Some("https://a.org/2.pdf")),
            paper("c", Some(1), Some("https://a.org/3.pdf")),
        ];
        assert_eq!(titles(&select_top_candidates(&candidates, 2, true)), vec!["a", "b"]);
        assert!(select_top_candidates(&candidates, 0, true).is_empty());
    }

    #[test]
    fn test_candidates_without_link_are_unavailable() {
        let candidates = vec![
            paper("no link", Some(500), None),
            paper("has link", Some(1), Some("https://a.org/1.pdf")),
        ];
        let ranked = partition_candidates(&candidates, true);
        assert_eq!(titles(&ranked.eligible), vec!["has link"]);
        assert_eq!(titles(&ranked.unavailable), vec!["no link"]);
    }

    #[test]
    fn test_non_http_direct_link_is_unavailable() {
        let candidates = vec![
            paper("ftp", Some(1), Some("ftp://a.org/1.pdf")),
            paper("relative", Some(1), Some("/files/1.pdf")),
        ];
        let ranked = partition_candidates(&candidates, true);
        assert!(ranked.eligible.is_empty());
        assert_eq!(ranked.unavailable.len(), 2);
    }

    #[test]
    fn test_duplicate_links_keep_first_occurrence() {
        let candidates = vec![
            paper("original", Some(1), Some("https://a.org/1.pdf")),
            paper("duplicate", Some(99), Some("https://a.org/1.pdf")),
        ];
        let ranked = partition_candidates(&candidates, true);
        assert_eq!(titles(&ranked.eligible), vec!["original"]);
        assert!(ranked.unavailable.is_empty());
    }

    #[test]
    fn test_arxiv_abstract_page_is_derived() {
        let candidate =
            PaperCandidate::new("arxiv").with_source_page_url("https://arxiv.org/abs/2005.00123");
        assert_eq!(
            resolve_pdf_url(&candidate).as_deref(),
            Some("https://arxiv.org/pdf/2005.00123.pdf")
        );
    }

    #[test]
    fn test_iacr_eprint_page_is_derived() {
        assert_eq!(
            derive_pdf_url("https://eprint.iacr.org/2023/123").as_deref(),
            Some("https://eprint.iacr.org/2023/123.pdf")
        );
        assert_eq!(derive_pdf_url("https://eprint.iacr.org/2023"), None);
    }

    #[test]
    fn test_unknown_landing_page_is_not_derived() {
        assert_eq!(
            derive_pdf_url("https://www.semanticscholar.org/paper/abc"),
            None
        );
        assert_eq!(derive_pdf_url("not a url"), None);
    }

    #[test]
    fn test_direct_link_wins_over_landing_page() {
        let candidate = PaperCandidate::new("both")
            .with_pdf_url("https://cdn.example.org/paper.pdf")
            .with_source_page_url("https://arxiv.org/abs/2005.00123");
        assert_eq!(
            resolve_pdf_url(&candidate).as_deref(),
            Some("https://cdn.example.org/paper.pdf")
        );
    }
}
