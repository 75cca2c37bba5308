//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Bytes of a minimal PDF padded to `len` bytes.
#[must_use]
pub fn pdf_body(len: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.5\n%\xE2\xE3\xCF\xD3\n".to_vec();
    bytes.resize(len, b'0');
    bytes
}

/// Search API JSON for the given `(title, citations, pdf_url)` rows.
#[must_use]
pub fn search_body(papers: &[(&str, u64, Option<&str>)]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = papers
        .iter()
        .map(|(title, citations, pdf_url)| {
            serde_json::json!({
                "paperId": title.to_lowercase().replace(' ', "-"),
                "title": title,
                "authors": [{"authorId": "1", "name": "Test Author"}],
                "year": 2022,
                "citationCount": citations,
                "openAccessPdf": pdf_url.map(|url| serde_json::json!({"url": url})),
            })
        })
        .collect();
    serde_json::json!({"total": data.len(), "offset": 0, "data": data})
}

/// How [`serve_truncated_pdf`] ends the connection after the partial body.
#[derive(Debug, Clone, Copy)]
pub enum BodyEnd {
    /// Keep the socket open without sending more.
    Stall,
    /// Close the socket short of the declared length.
    Close,
}

/// Serves one PDF response that declares `declared_len` body bytes but
/// sends only `sent_len`, then stalls or closes. Returns the URL to fetch,
/// or `None` when sockets are unavailable.
pub async fn serve_truncated_pdf(declared_len: usize, sent_len: usize, end: BodyEnd) -> Option<String> {
    if socket_guard::sockets_unavailable() {
        return None;
    }
    let listener = TcpListener::bind("127.0.0.1:0").await.ok()?;
    let addr = listener.local_addr().ok()?;

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        let mut request = Vec::new();
        let mut buf = [0_u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/pdf\r\ncontent-length: {declared_len}\r\n\r\n"
        );
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }
        let _ = socket.write_all(&pdf_body(sent_len)).await;
        let _ = socket.flush().await;
        match end {
            BodyEnd::Stall => tokio::time::sleep(std::time::Duration::from_secs(30)).await,
            BodyEnd::Close => drop(socket),
        }
    });

    Some(format!("http://{addr}/paper.pdf"))
}
