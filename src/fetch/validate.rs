//! PDF content validation.

use std::fmt;
use std::path::Path;

use tokio::io::AsyncReadExt;

/// Leading bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Result of checking a file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfValidity {
    /// Large enough and starts with `%PDF`.
    Valid,
    /// Smaller than the configured minimum; usually an error page.
    TooSmall {
        /// Actual size in bytes.
        size: u64,
        /// Configured minimum.
        min: u64,
    },
    /// Does not start with `%PDF`.
    MissingSignature,
}

impl PdfValidity {
    /// Whether the file is acceptable.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self == Self::Valid
    }
}

impl fmt::Display for PdfValidity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("valid PDF"),
            Self::TooSmall { size, min } => {
                write!(f, "file is {size} bytes, below the {min} byte minimum")
            }
            Self::MissingSignature => f.write_str("file does not start with %PDF"),
        }
    }
}

/// Checks that the file at `path` is at least `min_size` bytes and begins
/// with [`PDF_MAGIC`].
///
/// # Errors
///
/// Returns the IO error if the file cannot be opened or read.
pub async fn validate_pdf(path: &Path, min_size: u64) -> Result<PdfValidity, std::io::Error> {
    let size = tokio::fs::metadata(path).await?.len();
    if size < min_size {
        return Ok(PdfValidity::TooSmall {
            size,
            min: min_size,
        });
    }

    let mut file = tokio::fs::File::open(path).await?;
    let mut header = [0_u8; 4];
    match file.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Ok(PdfValidity::MissingSignature);
        }
        Err(e) => return Err(e),
    }

    if &header == PDF_MAGIC {
        Ok(PdfValidity::Valid)
    } else {
        Ok(PdfValidity::MissingSignature)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn pdf_bytes(len: usize) -> Vec<u8> {
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.resize(len, b'0');
        bytes
    }

    #[tokio::test]
    async fn test_valid_pdf_at_exact_minimum() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, pdf_bytes(1000)).unwrap();
        assert_eq!(validate_pdf(&path, 1000).await.unwrap(), PdfValidity::Valid);
    }

    #[tokio::test]
    async fn test_one_byte_below_minimum_is_too_small() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, pdf_bytes(999)).unwrap();
        assert_eq!(
            validate_pdf(&path, 1000).await.unwrap(),
            PdfValidity::TooSmall {
                size: 999,
                min: 1000
            }
        );
    }

    #[tokio::test]
    async fn test_html_body_missing_signature() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.pdf");
        let mut body = b"<!DOCTYPE html><html>".to_vec();
        body.resize(4096, b' ');
        std::fs::write(&path, body).unwrap();
        assert_eq!(
            validate_pdf(&path, 1000).await.unwrap(),
            PdfValidity::MissingSignature
        );
    }

    #[tokio::test]
    async fn test_short_file_with_zero_minimum_missing_signature() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"%P").unwrap();
        assert_eq!(
            validate_pdf(&path, 0).await.unwrap(),
            PdfValidity::MissingSignature
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(validate_pdf(&dir.path().join("absent.pdf"), 1000).await.is_err());
    }
}
