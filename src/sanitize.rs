//! Filesystem-safe names for topics and paper titles.
//!
//! Topic directories and PDF file names are both derived from free text
//! returned by the search API, so everything that touches the filesystem goes
//! through [`sanitize`] first.

/// Punctuation kept by [`sanitize`] in addition to alphanumerics.
const ALLOWED_PUNCTUATION: [char; 6] = [' ', '-', '_', '.', '(', ')'];

/// Maximum bytes of a file stem. Leaves room for `_NN.pdf.part` under the
/// common 255-byte file name limit.
pub const MAX_FILE_STEM_BYTES: usize = 200;

/// Maximum bytes of a topic directory name.
pub const MAX_DIRECTORY_NAME_BYTES: usize = 200;

/// File stem used when a title has no usable characters.
pub const UNTITLED_FILE_STEM: &str = "untitled";

/// Returns true if `c` may appear in sanitized output.
#[must_use]
pub fn is_allowed_char(c: char) -> bool {
    c.is_alphanumeric() || ALLOWED_PUNCTUATION.contains(&c)
}

/// Reduces arbitrary text to a string usable as a single path segment.
///
/// Keeps alphanumeric characters plus space, hyphen, underscore, period and
/// parentheses, then trims surrounding whitespace and periods so the result is
/// never `.`, `..` or a hidden file name. Empty input yields empty output.
///
/// ```
/// use paperfetch_core::sanitize::sanitize;
///
/// assert_eq!(sanitize("  AI: Agents / Tools?  "), "AI Agents  Tools");
/// assert_eq!(sanitize(""), "");
/// ```
#[must_use]
pub fn sanitize(text: &str) -> String {
    let kept: String = text.chars().filter(|c| is_allowed_char(*c)).collect();
    kept.trim_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}

/// Builds a PDF file stem from a paper title.
///
/// The stem is sanitized, capped at [`MAX_FILE_STEM_BYTES`] bytes on a
/// character boundary, and falls back to [`UNTITLED_FILE_STEM`] when nothing
/// usable remains.
#[must_use]
pub fn file_stem_for_title(title: &str) -> String {
    let stem = capped_segment(title, MAX_FILE_STEM_BYTES);
    if stem.is_empty() {
        UNTITLED_FILE_STEM.to_string()
    } else {
        stem
    }
}

/// Builds a directory name from a topic, capped at
/// [`MAX_DIRECTORY_NAME_BYTES`] bytes. Empty when the topic has no usable
/// characters.
#[must_use]
pub fn directory_name_for_topic(topic: &str) -> String {
    capped_segment(topic, MAX_DIRECTORY_NAME_BYTES)
}

fn capped_segment(text: &str, max_bytes: usize) -> String {
    let sanitized = sanitize(text);
    let truncated = truncate_to_char_boundary(&sanitized, max_bytes);
    // Truncation can expose trailing whitespace or periods again.
    truncated
        .trim_end_matches(|c: char| c.is_whitespace() || c == '.')
        .to_string()
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a
/// character.
fn truncate_to_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::{Component, Path};

    use super::*;

    #[test]
    fn test_sanitize_empty_input_yields_empty_output() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("   "), "");
    }

    #[test]
    fn test_sanitize_strips_path_separators_and_reserved_chars() {
        assert_eq!(sanitize("a/b\\c:d*e?f\"g<h>i|j"), "abcdefghij");
    }

    #[test]
    fn test_sanitize_keeps_allow_list_punctuation() {
        assert_eq!(
            sanitize("Attention (Is) All-You_Need v2.0"),
            "Attention (Is) All-You_Need v2.0"
        );
    }

    #[test]
    fn test_sanitize_keeps_unicode_letters() {
        assert_eq!(sanitize("Über Lernen 日本語"), "Über Lernen 日本語");
    }

    #[test]
    fn test_sanitize_trims_surrounding_whitespace_and_periods() {
        assert_eq!(sanitize("  quantum computing \n"), "quantum computing");
        assert_eq!(sanitize(".hidden"), "hidden");
        assert_eq!(sanitize("Smith et al."), "Smith et al");
        assert_eq!(sanitize(".."), "");
        assert_eq!(sanitize("."), "");
    }

    #[test]
    fn test_sanitize_output_never_contains_disallowed_chars() {
        let inputs = [
            "Deep Learning: A Survey",
            "R&D in ML — 2024 edition!",
            "../../etc/passwd",
            "C:\\Windows\\System32",
            "tab\tnewline\nnull\0",
            "emoji 🚀 title",
            "¿Qué es esto?",
            "%PDF-1.7",
        ];
        for input in inputs {
            let out = sanitize(input);
            assert!(
                out.chars().all(is_allowed_char),
                "disallowed char in {out:?} (from {input:?})"
            );
        }
    }

    #[test]
    fn test_sanitize_output_is_single_normal_path_segment() {
        for input in ["../../etc/passwd", "..", "/abs/path", "a/../b", "~/.ssh"] {
            let out = sanitize(input);
            if out.is_empty() {
                continue;
            }
            let components: Vec<_> = Path::new(&out).components().collect();
            assert_eq!(components.len(), 1, "{out:?} is not a single segment");
            assert!(matches!(components[0], Component::Normal(_)), "{out:?}");
        }
    }

    #[test]
    fn test_file_stem_for_title_falls_back_when_empty() {
        assert_eq!(file_stem_for_title("???"), UNTITLED_FILE_STEM);
        assert_eq!(file_stem_for_title(""), UNTITLED_FILE_STEM);
    }

    #[test]
    fn test_file_stem_for_title_truncates_long_titles() {
        let title = "word ".repeat(100);
        let stem = file_stem_for_title(&title);
        assert!(stem.len() <= MAX_FILE_STEM_BYTES);
        assert!(!stem.ends_with(' '));
    }

    #[test]
    fn test_file_stem_for_multibyte_title_fits_byte_budget() {
        let title = "量子計算".repeat(40);
        let stem = file_stem_for_title(&title);
        assert!(stem.len() <= MAX_FILE_STEM_BYTES, "{} bytes", stem.len());
        assert!(title.starts_with(&stem));
        // 3-byte characters: 66 of them fit in 200 bytes.
        assert_eq!(stem.chars().count(), 66);
    }

    #[test]
    fn test_multibyte_stem_with_suffix_can_be_created() {
        let dir = tempfile::TempDir::new().unwrap();
        let stem = file_stem_for_title(&"量子計算".repeat(40));
        let path = dir.path().join(format!("{stem}_99.pdf.part"));
        std::fs::write(&path, b"x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_directory_name_for_long_topic_is_capped() {
        let dir = tempfile::TempDir::new().unwrap();
        let name = directory_name_for_topic(&"quantum computing ".repeat(20));
        assert!(name.len() <= MAX_DIRECTORY_NAME_BYTES);
        assert!(!name.ends_with(' '));
        std::fs::create_dir_all(dir.path().join(&name)).unwrap();
    }

    #[test]
    fn test_directory_name_for_short_topic_is_sanitized_only() {
        assert_eq!(directory_name_for_topic(" AI / ML "), "AI  ML");
        assert_eq!(directory_name_for_topic("???"), "");
    }

    #[test]
    fn test_truncate_never_splits_a_character() {
        assert_eq!(truncate_to_char_boundary("aé", 2), "a");
        assert_eq!(truncate_to_char_boundary("aé", 3), "aé");
        assert_eq!(truncate_to_char_boundary("🚀", 3), "");
    }
}
