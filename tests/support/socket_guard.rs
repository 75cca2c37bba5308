//! Socket-bound test gate, shared by unit and integration tests.
//!
//! Sandboxed runners often refuse to bind localhost. Tests that need a
//! listener return early there, unless `PAPERFETCH_REQUIRE_SOCKET_TESTS` is
//! set, in which case they fail.

#![allow(dead_code)]

use std::net::TcpListener;

use wiremock::MockServer;

const REQUIRE_SOCKET_TESTS_ENV: &str = "PAPERFETCH_REQUIRE_SOCKET_TESTS";

fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_SOCKET_TESTS_ENV)
        .is_ok_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// True when localhost cannot be bound and the calling test should return.
pub fn sockets_unavailable() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }
    assert!(
        !socket_tests_required(),
        "[socket-bound-test] cannot bind localhost socket and {REQUIRE_SOCKET_TESTS_ENV} is set"
    );
    eprintln!("[socket-bound-test] cannot bind localhost socket; skipping");
    true
}

/// Starts a mock server, or `None` when sockets are unavailable.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if sockets_unavailable() {
        None
    } else {
        Some(MockServer::start().await)
    }
}
