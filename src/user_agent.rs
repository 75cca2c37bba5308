//! User-Agent strings for search and PDF download traffic.
//!
//! Search requests identify the tool. PDF downloads default to a browser
//! identity because several academic hosts reject requests without one.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/paperfetch";

/// Browser User-Agent sent with PDF downloads by default.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent for search API requests (identifies the tool).
#[must_use]
pub fn default_search_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("paperfetch/{version} (academic-research-tool; +{PROJECT_UA_URL})")
}
